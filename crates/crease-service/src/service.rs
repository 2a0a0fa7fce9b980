use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crease_engine::{
    BallRecorded, BallUndone, Delivery, InningsSelector, Match, ScoreSnapshot, ScoringError,
    TossDecision,
};
use crease_fabric::{EventFabric, EventFilter, EventKind, EventPayload, EventStream};
use crease_ledger::{Ball, Scorecard};
use crease_types::{AccountId, MatchConfig, MatchId, MatchSettings, PlayerRef, TeamSide};

use crate::auth::{AllowAll, ScoringAction, ScoringAuthority, UmpireOnly};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{InMemoryMatchStore, MatchStore};

type Events = Vec<(EventKind, EventPayload)>;

/// Multi-caller front for the match engine.
///
/// Mutating calls on one match run one at a time behind a per-match async
/// mutex. Each call works on a private copy of the match, saves it with a
/// version check, and only then publishes events. Calls on different
/// matches never contend.
pub struct ScoringService {
    config: ServiceConfig,
    store: Arc<dyn MatchStore>,
    authority: Arc<dyn ScoringAuthority>,
    fabric: Arc<EventFabric>,
    locks: Mutex<HashMap<MatchId, Arc<AsyncMutex<()>>>>,
}

impl ScoringService {
    /// In-memory store, with umpire-only or open authorization per config.
    pub fn new(config: ServiceConfig) -> Self {
        let authority: Arc<dyn ScoringAuthority> = if config.require_umpire {
            Arc::new(UmpireOnly)
        } else {
            Arc::new(AllowAll)
        };
        let store = Arc::new(InMemoryMatchStore::new(config.max_matches));
        Self::with_parts(config, store, authority)
    }

    pub fn with_parts(
        config: ServiceConfig,
        store: Arc<dyn MatchStore>,
        authority: Arc<dyn ScoringAuthority>,
    ) -> Self {
        let fabric = Arc::new(EventFabric::new(config.fabric_config()));
        Self {
            config,
            store,
            authority,
            fabric,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn fabric(&self) -> &Arc<EventFabric> {
        &self.fabric
    }

    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.fabric.subscribe(filter)
    }

    // -- reads ---------------------------------------------------------------

    pub fn get_match(&self, id: MatchId) -> ServiceResult<Arc<Match>> {
        self.store.get(id)?.ok_or(ServiceError::MatchNotFound(id))
    }

    pub fn snapshot(&self, id: MatchId) -> ServiceResult<ScoreSnapshot> {
        Ok(self.get_match(id)?.snapshot())
    }

    pub fn scorecard(
        &self,
        id: MatchId,
        selector: InningsSelector,
    ) -> ServiceResult<Option<Scorecard>> {
        Ok(self.get_match(id)?.scorecard(selector))
    }

    pub fn match_ids(&self) -> ServiceResult<Vec<MatchId>> {
        self.store.ids()
    }

    // -- lifecycle -----------------------------------------------------------

    /// Validate `config` and register a new match in `SCHEDULED`.
    pub async fn create_match(&self, config: MatchConfig) -> ServiceResult<Arc<Match>> {
        let game = Match::new(config)?;
        let stored = self.store.insert(game)?;
        info!(match_id = %stored.id(), "match registered");
        Ok(stored)
    }

    /// Replace the playing conditions. Fails once the toss is conducted.
    pub async fn amend_settings(
        &self,
        caller: &AccountId,
        id: MatchId,
        settings: MatchSettings,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::AmendSettings,
                |game| game.amend_settings(settings),
                silent,
            )
            .await?;
        Ok(game)
    }

    pub async fn open_toss(&self, caller: &AccountId, id: MatchId) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(caller, id, ScoringAction::Toss, Match::open_toss, silent)
            .await?;
        Ok(game)
    }

    pub async fn conduct_toss(
        &self,
        caller: &AccountId,
        id: MatchId,
        winner: TeamSide,
        decision: TossDecision,
    ) -> ServiceResult<Arc<Match>> {
        let (game, _) = self
            .mutate(
                caller,
                id,
                ScoringAction::Toss,
                |game| game.conduct_toss(winner, decision),
                |game, _| {
                    game.toss()
                        .map(|toss| (EventKind::Toss, EventPayload::Toss { toss: *toss }))
                        .into_iter()
                        .collect()
                },
            )
            .await?;
        Ok(game)
    }

    pub async fn start_second_innings(
        &self,
        caller: &AccountId,
        id: MatchId,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::Score,
                Match::start_second_innings,
                silent,
            )
            .await?;
        Ok(game)
    }

    /// Force-end the match with an abandoned result.
    pub async fn abandon(
        &self,
        caller: &AccountId,
        id: MatchId,
        reason: &str,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::Abandon,
                |game| game.abandon(reason),
                |_, _| closed(reason),
            )
            .await?;
        Ok(game)
    }

    /// Call the match off without a result.
    pub async fn cancel(
        &self,
        caller: &AccountId,
        id: MatchId,
        reason: &str,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::Cancel,
                |game| game.cancel(reason),
                |_, _| closed(reason),
            )
            .await?;
        Ok(game)
    }

    // -- scoring -------------------------------------------------------------

    /// Put a batting pair in. The first pair of an innings starts it and
    /// publishes `InningsStart`.
    pub async fn set_batsmen(
        &self,
        caller: &AccountId,
        id: MatchId,
        striker: PlayerRef,
        non_striker: Option<PlayerRef>,
    ) -> ServiceResult<Arc<Match>> {
        let (game, _) = self
            .mutate(
                caller,
                id,
                ScoringAction::Score,
                |game| game.set_batsmen(striker, non_striker),
                |game, started| match (*started, game.current()) {
                    (true, Some(innings)) => {
                        vec![(EventKind::InningsStart, EventPayload::Innings { innings })]
                    }
                    _ => Vec::new(),
                },
            )
            .await?;
        Ok(game)
    }

    /// Fill the crease slot left empty by a wicket.
    pub async fn set_new_batter(
        &self,
        caller: &AccountId,
        id: MatchId,
        player: PlayerRef,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::Score,
                |game| game.set_new_batter(player),
                silent,
            )
            .await?;
        Ok(game)
    }

    pub async fn set_bowler(
        &self,
        caller: &AccountId,
        id: MatchId,
        bowler: PlayerRef,
    ) -> ServiceResult<Arc<Match>> {
        let (game, ()) = self
            .mutate(
                caller,
                id,
                ScoringAction::Score,
                |game| game.set_bowler(bowler),
                silent,
            )
            .await?;
        Ok(game)
    }

    /// Score one delivery and publish what it caused.
    pub async fn record_ball(
        &self,
        caller: &AccountId,
        id: MatchId,
        delivery: Delivery,
    ) -> ServiceResult<BallRecorded> {
        let (_, recorded) = self
            .mutate(
                caller,
                id,
                ScoringAction::Score,
                |game| game.apply_ball(delivery),
                ball_events,
            )
            .await?;
        Ok(recorded)
    }

    pub async fn undo_last_ball(
        &self,
        caller: &AccountId,
        id: MatchId,
    ) -> ServiceResult<BallUndone> {
        let (_, undone) = self
            .mutate(
                caller,
                id,
                ScoringAction::Undo,
                Match::undo_last_ball,
                |_, undone: &BallUndone| {
                    vec![(
                        EventKind::BallUndone,
                        EventPayload::Ball {
                            ball: undone.ball.clone(),
                        },
                    )]
                },
            )
            .await?;
        Ok(undone)
    }

    /// Truncate the current innings to `len` balls. One `BallUndone` event is
    /// published per removed ball, newest first.
    pub async fn rewind_innings(
        &self,
        caller: &AccountId,
        id: MatchId,
        len: usize,
    ) -> ServiceResult<Vec<Ball>> {
        let (_, removed) = self
            .mutate(
                caller,
                id,
                ScoringAction::Undo,
                |game| game.rewind_innings_to(len),
                |_, removed: &Vec<Ball>| {
                    removed
                        .iter()
                        .rev()
                        .map(|ball| (EventKind::BallUndone, EventPayload::Ball { ball: ball.clone() }))
                        .collect()
                },
            )
            .await?;
        Ok(removed)
    }

    // -- internals -----------------------------------------------------------

    /// The mutex guarding `id`. Unknown matches get no entry, and terminal
    /// matches get a private mutex since nothing can change them any more.
    fn match_lock(&self, id: MatchId) -> ServiceResult<Arc<AsyncMutex<()>>> {
        if self.get_match(id)?.status().is_terminal() {
            return Ok(Arc::default());
        }
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| ServiceError::Internal("match lock table poisoned".into()))?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }

    fn release_lock(&self, id: MatchId) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&id);
        }
    }

    /// Run `op` on a copy of the match under the match's lock, save the copy
    /// with a version check, then publish what `announce` derives from the
    /// committed match. Nothing is stored or published if `op` fails.
    ///
    /// Publication happens before the lock is released, so subscribers see
    /// one match's events in commit order.
    async fn mutate<T, F, A>(
        &self,
        caller: &AccountId,
        id: MatchId,
        action: ScoringAction,
        op: F,
        announce: A,
    ) -> ServiceResult<(Arc<Match>, T)>
    where
        F: FnOnce(&mut Match) -> Result<T, ScoringError> + Send,
        A: FnOnce(&Match, &T) -> Events + Send,
        T: Send,
    {
        let lock = self.match_lock(id)?;
        let _guard = lock.lock().await;

        let current = self.get_match(id)?;
        if !self.authority.authorize(caller, &current, action).await? {
            warn!(match_id = %id, caller = %caller, %action, "scoring call rejected");
            return Err(ServiceError::Unauthorized {
                id,
                account: caller.clone(),
                action: action.to_string(),
            });
        }

        let expected = current.version();
        let mut draft = Match::clone(&current);
        let output = op(&mut draft).map_err(|error| {
            debug!(match_id = %id, %action, %error, "scoring call failed");
            error
        })?;
        let committed = self.store.save(draft, expected)?;

        self.publish(&committed, announce(&committed, &output));
        if committed.status().is_terminal() {
            self.release_lock(id);
        }
        Ok((committed, output))
    }

    fn publish(&self, game: &Match, events: Events) {
        if events.is_empty() {
            return;
        }
        if let Err(error) = self.fabric.emit_batch(game.id(), game.snapshot(), events) {
            warn!(match_id = %game.id(), %error, "events dropped after commit");
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

fn silent<T>(_: &Match, _: &T) -> Events {
    Vec::new()
}

fn closed(reason: &str) -> Events {
    vec![(
        EventKind::MatchEnd,
        EventPayload::Closed {
            reason: reason.to_string(),
        },
    )]
}

/// Everything a recorded delivery caused, in the order subscribers expect.
fn ball_events(game: &Match, recorded: &BallRecorded) -> Events {
    let mut events: Events = vec![(
        EventKind::BallRecorded,
        EventPayload::Ball {
            ball: recorded.ball.clone(),
        },
    )];
    if let Some(fall) = &recorded.fall_of_wicket {
        events.push((EventKind::Wicket, EventPayload::Wicket { fall: fall.clone() }));
    }
    if recorded.over_completed {
        events.push((
            EventKind::OverComplete,
            EventPayload::Over {
                over: recorded.ball.over,
                maiden: recorded.maiden_completed,
            },
        ));
    }
    if recorded.innings_completed {
        events.push((
            EventKind::InningsEnd,
            EventPayload::Innings {
                innings: recorded.innings,
            },
        ));
    }
    if let (true, Some(result)) = (recorded.match_completed, game.result()) {
        events.push((
            EventKind::MatchEnd,
            EventPayload::Result {
                result: result.clone(),
            },
        ));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crease_engine::MatchStatus;
    use crease_ledger::BallOutcome;
    use crease_types::TeamRoster;

    fn p(name: &str) -> PlayerRef {
        PlayerRef::guest(name)
    }

    fn umpire() -> AccountId {
        AccountId::new("ump")
    }

    fn match_config(overs: u32) -> MatchConfig {
        let roster = |name: &str, prefix: &str| {
            TeamRoster::new(name, (1..=3).map(|n| p(&format!("{prefix}{n}"))).collect())
        };
        MatchConfig {
            settings: MatchSettings {
                overs,
                players_per_team: 3,
                ..Default::default()
            },
            team_a: roster("Rovers", "a"),
            team_b: roster("Strikers", "b"),
            umpire: umpire(),
        }
    }

    /// A match in progress with a1/a2 batting and b1 bowling.
    async fn ready(service: &ScoringService, overs: u32) -> MatchId {
        let id = service.create_match(match_config(overs)).await.unwrap().id();
        service.open_toss(&umpire(), id).await.unwrap();
        service
            .conduct_toss(&umpire(), id, TeamSide::A, TossDecision::Bat)
            .await
            .unwrap();
        service
            .set_batsmen(&umpire(), id, p("a1"), Some(p("a2")))
            .await
            .unwrap();
        service.set_bowler(&umpire(), id, p("b1")).await.unwrap();
        id
    }

    fn drain(stream: &mut EventStream) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = stream.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn scoring_publishes_events_after_commit() {
        let service = ScoringService::new(ServiceConfig::default());
        let mut stream = service.subscribe(EventFilter::default());
        let id = ready(&service, 1).await;
        assert_eq!(drain(&mut stream), vec![EventKind::Toss, EventKind::InningsStart]);

        for _ in 0..5 {
            service
                .record_ball(&umpire(), id, Delivery::new(BallOutcome::Dot))
                .await
                .unwrap();
        }
        let recorded = service
            .record_ball(&umpire(), id, Delivery::new(BallOutcome::Wicket))
            .await
            .unwrap();
        assert!(recorded.innings_completed);

        let kinds = drain(&mut stream);
        assert_eq!(
            &kinds[kinds.len() - 4..],
            &[
                EventKind::BallRecorded,
                EventKind::Wicket,
                EventKind::OverComplete,
                EventKind::InningsEnd,
            ]
        );
        let game = service.get_match(id).unwrap();
        assert_eq!(game.status(), MatchStatus::InningsBreak);
        assert_eq!(service.snapshot(id).unwrap().wickets, 1);
    }

    #[tokio::test]
    async fn stranger_cannot_score() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = ready(&service, 2).await;
        let version = service.get_match(id).unwrap().version();
        let mut stream = service.subscribe(EventFilter::for_match(id));

        let error = service
            .record_ball(&AccountId::new("fan"), id, Delivery::new(BallOutcome::Six))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Authorization);
        assert_eq!(service.get_match(id).unwrap().version(), version);
        assert!(drain(&mut stream).is_empty());
    }

    #[tokio::test]
    async fn open_service_lets_anyone_score() {
        let service = ScoringService::new(ServiceConfig {
            require_umpire: false,
            ..Default::default()
        });
        let id = ready(&service, 2).await;
        service
            .record_ball(&AccountId::new("fan"), id, Delivery::new(BallOutcome::Four))
            .await
            .unwrap();
        assert_eq!(service.snapshot(id).unwrap().runs, 4);
    }

    #[tokio::test]
    async fn failed_calls_leave_no_trace() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = service.create_match(match_config(2)).await.unwrap().id();

        let error = service
            .record_ball(&umpire(), id, Delivery::new(BallOutcome::One))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(service.get_match(id).unwrap().version(), 0);

        let error = service.undo_last_ball(&umpire(), MatchId::new()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn undo_publishes_ball_undone() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = ready(&service, 2).await;
        service
            .record_ball(&umpire(), id, Delivery::new(BallOutcome::Three))
            .await
            .unwrap();
        let mut stream = service.subscribe(EventFilter {
            kinds: Some(vec![EventKind::BallUndone]),
            ..Default::default()
        });

        let undone = service.undo_last_ball(&umpire(), id).await.unwrap();
        assert_eq!(undone.ball.runs.total_runs, 3);
        let event = stream.try_recv().unwrap();
        assert_eq!(event.snapshot.runs, 0);

        let error = service.undo_last_ball(&umpire(), id).await.unwrap_err();
        assert_eq!(error.to_string(), "validation error: no balls to undo");
    }

    #[tokio::test]
    async fn rewind_reports_removed_balls() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = ready(&service, 2).await;
        for outcome in [BallOutcome::One, BallOutcome::Two, BallOutcome::Four] {
            service
                .record_ball(&umpire(), id, Delivery::new(outcome))
                .await
                .unwrap();
        }
        let removed = service.rewind_innings(&umpire(), id, 1).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(service.snapshot(id).unwrap().runs, 1);
    }

    #[tokio::test]
    async fn concurrent_scoring_is_serialized() {
        let service = Arc::new(ScoringService::new(ServiceConfig::default()));
        let id = ready(&service, 2).await;
        let before = service.get_match(id).unwrap().version();

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .record_ball(&umpire(), id, Delivery::new(BallOutcome::Two))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let game = service.get_match(id).unwrap();
        let innings = game.current_innings().unwrap();
        let positions: Vec<(u32, u32)> = innings.ledger().iter().map(Ball::position).collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 5)]);
        assert_eq!(innings.totals().runs, 10);
        assert_eq!(game.version(), before + 5);
        game.check_invariants().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_events_arrive_in_commit_order() {
        let service = Arc::new(ScoringService::new(ServiceConfig::default()));
        let id = ready(&service, 2).await;
        let mut stream = service.subscribe(EventFilter {
            matches: Some(vec![id]),
            kinds: Some(vec![EventKind::BallRecorded]),
            since: None,
        });

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .record_ball(&umpire(), id, Delivery::new(BallOutcome::Wide))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut versions = Vec::new();
        while let Ok(event) = stream.try_recv() {
            versions.push(event.snapshot.version);
        }
        assert_eq!(versions.len(), 20);
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));

        let runs: Vec<u32> = service
            .fabric()
            .recent(&EventFilter::for_match(id))
            .iter()
            .filter(|event| event.kind == EventKind::BallRecorded)
            .map(|event| event.snapshot.runs)
            .collect();
        assert_eq!(runs, (1..=20).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn unknown_matches_leave_no_lock_entries() {
        let service = ScoringService::new(ServiceConfig::default());
        for _ in 0..100 {
            let error = service
                .undo_last_ball(&umpire(), MatchId::new())
                .await
                .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::NotFound);
        }
        assert_eq!(service.lock_count(), 0);
    }

    #[tokio::test]
    async fn finished_matches_release_their_lock() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = ready(&service, 2).await;
        assert_eq!(service.lock_count(), 1);

        service.abandon(&umpire(), id, "rain").await.unwrap();
        assert_eq!(service.lock_count(), 0);

        let error = service
            .record_ball(&umpire(), id, Delivery::new(BallOutcome::Dot))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(service.lock_count(), 0);
    }

    #[tokio::test]
    async fn abandon_publishes_match_end() {
        let service = ScoringService::new(ServiceConfig::default());
        let id = ready(&service, 2).await;
        let mut stream = service.subscribe(EventFilter::for_match(id));

        let game = service.abandon(&umpire(), id, "bad light").await.unwrap();
        assert_eq!(game.status(), MatchStatus::Abandoned);
        let event = stream.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::MatchEnd);
        assert_eq!(
            event.payload,
            EventPayload::Closed {
                reason: "bad light".into()
            }
        );
    }
}
