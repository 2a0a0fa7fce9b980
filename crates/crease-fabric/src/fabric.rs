//! In-process event fabric.
//!
//! Subscribers get a bounded channel each. Batches are stamped with
//! sequence numbers under the history lock so every subscriber sees the
//! same order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crease_engine::ScoreSnapshot;
use crease_types::MatchId;

use crate::error::{FabricError, Result};
use crate::event::{EventKind, EventPayload, ScoreEvent};

/// Filter for subscribing to a subset of scoring events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events for these matches are delivered.
    pub matches: Option<Vec<MatchId>>,
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events with a later sequence number are delivered.
    pub since: Option<u64>,
}

impl EventFilter {
    /// Everything about one match.
    pub fn for_match(id: MatchId) -> Self {
        Self {
            matches: Some(vec![id]),
            ..Default::default()
        }
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &ScoreEvent) -> bool {
        if let Some(ref matches) = self.matches {
            if !matches.contains(&event.match_id) {
                return false;
            }
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.sequence <= since {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for scoring events.
pub type EventStream = broadcast::Receiver<ScoreEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<ScoreEvent>,
}

/// Fan-out router that delivers events to matching subscribers.
struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventRouter {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn subscribe(&self, filter: EventFilter, capacity: usize) -> EventStream {
        let (tx, rx) = broadcast::channel(capacity);
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(Subscriber { filter, sender: tx });
        rx
    }

    /// Route an event to all matching subscribers, pruning closed channels.
    fn route(&self, event: &ScoreEvent) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                sub.sender.receiver_count() > 0
            }
        });
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("router lock poisoned")
            .len()
    }

    fn clear(&self) {
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .clear();
    }
}

/// Configuration for the [`EventFabric`].
#[derive(Clone, Debug)]
pub struct FabricConfig {
    /// Capacity of per-subscriber broadcast channels.
    pub channel_capacity: usize,
    /// Number of recent events kept for late subscribers.
    pub history_capacity: usize,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_capacity: 512,
        }
    }
}

/// Central event bus for live scoring.
///
/// Stamps each event with the next sequence number, appends it to a bounded
/// history, and routes it to matching subscribers.
pub struct EventFabric {
    sequence: AtomicU64,
    history: Mutex<VecDeque<ScoreEvent>>,
    router: EventRouter,
    config: FabricConfig,
    closed: AtomicBool,
}

impl EventFabric {
    pub fn new(config: FabricConfig) -> Self {
        info!(
            channel_capacity = config.channel_capacity,
            history_capacity = config.history_capacity,
            "fabric started"
        );
        Self {
            sequence: AtomicU64::new(0),
            history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
            router: EventRouter::new(),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Emit a single event.
    pub fn emit(
        &self,
        match_id: MatchId,
        kind: EventKind,
        payload: EventPayload,
        snapshot: ScoreSnapshot,
    ) -> Result<ScoreEvent> {
        self.ensure_open()?;
        let mut history = self.history.lock().expect("history lock poisoned");
        let event = self.stamp(match_id, kind, payload, snapshot, Utc::now());
        self.publish(&mut history, &event);
        debug!(seq = event.sequence, match_id = %match_id, kind = %kind, "event emitted");
        Ok(event)
    }

    /// Emit several events for one committed change.
    ///
    /// The batch is stamped and recorded under one history lock, so
    /// subscribers see it in sequence order with nothing interleaved.
    pub fn emit_batch(
        &self,
        match_id: MatchId,
        snapshot: ScoreSnapshot,
        events: Vec<(EventKind, EventPayload)>,
    ) -> Result<Vec<ScoreEvent>> {
        self.ensure_open()?;
        let mut history = self.history.lock().expect("history lock poisoned");
        let emitted_at = Utc::now();
        let stamped: Vec<ScoreEvent> = events
            .into_iter()
            .map(|(kind, payload)| self.stamp(match_id, kind, payload, snapshot.clone(), emitted_at))
            .collect();
        for event in &stamped {
            self.publish(&mut history, event);
        }
        drop(history);

        debug!(match_id = %match_id, count = stamped.len(), "batch emitted");
        Ok(stamped)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FabricError::Shutdown);
        }
        Ok(())
    }

    fn stamp(
        &self,
        match_id: MatchId,
        kind: EventKind,
        payload: EventPayload,
        snapshot: ScoreSnapshot,
        emitted_at: chrono::DateTime<Utc>,
    ) -> ScoreEvent {
        ScoreEvent {
            sequence: self.sequence.fetch_add(1, Ordering::AcqRel) + 1,
            match_id,
            kind,
            payload,
            snapshot,
            emitted_at,
        }
    }

    fn publish(&self, history: &mut VecDeque<ScoreEvent>, event: &ScoreEvent) {
        if self.config.history_capacity > 0 {
            if history.len() == self.config.history_capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        self.router.route(event);
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.router.subscribe(filter, self.config.channel_capacity)
    }

    /// Recent events matching `filter`, oldest first.
    pub fn recent(&self, filter: &EventFilter) -> Vec<ScoreEvent> {
        self.history
            .lock()
            .expect("history lock poisoned")
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    /// Sequence number of the latest emitted event, zero if none.
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    /// Stop accepting events and drop all subscribers, closing their streams.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.router.clear();
            info!(last_sequence = self.last_sequence(), "fabric shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for EventFabric {
    fn default() -> Self {
        Self::new(FabricConfig::default())
    }
}
