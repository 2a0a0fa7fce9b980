use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crease_engine::{FallOfWicket, InningsSelector, MatchResult, ScoreSnapshot, Toss};
use crease_ledger::Ball;
use crease_types::MatchId;

use crate::error::Result;

/// Classification of scoring events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The toss has been conducted.
    Toss,
    /// A batting pair took guard and an innings began.
    InningsStart,
    /// A delivery was recorded.
    BallRecorded,
    /// A delivery dismissed a batter.
    Wicket,
    /// The sixth legal ball of an over was bowled.
    OverComplete,
    /// An innings ended.
    InningsEnd,
    /// The match reached a result, or was abandoned or cancelled.
    MatchEnd,
    /// The latest delivery was removed.
    BallUndone,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Toss => "toss",
            Self::InningsStart => "innings-start",
            Self::BallRecorded => "ball-recorded",
            Self::Wicket => "wicket",
            Self::OverComplete => "over-complete",
            Self::InningsEnd => "innings-end",
            Self::MatchEnd => "match-end",
            Self::BallUndone => "ball-undone",
        };
        f.write_str(s)
    }
}

/// Kind-specific data carried by an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The snapshot alone describes the event.
    Empty,
    Toss { toss: Toss },
    Innings { innings: InningsSelector },
    Ball { ball: Ball },
    Wicket { fall: FallOfWicket },
    Over { over: u32, maiden: bool },
    Result { result: MatchResult },
    Closed { reason: String },
}

/// A single event flowing through the fabric.
///
/// Every event carries the fabric sequence number, the match it belongs to,
/// its kind and payload, and the scoreboard snapshot taken right after the
/// change it reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// Monotonic per-fabric sequence, starting at 1.
    pub sequence: u64,
    pub match_id: MatchId,
    pub kind: EventKind,
    pub payload: EventPayload,
    pub snapshot: ScoreSnapshot,
    pub emitted_at: DateTime<Utc>,
}

impl ScoreEvent {
    /// One-line JSON encoding, as pushed to spectators.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
