//! Match-scoring state machine for Crease.
//!
//! A scoring action enters the [`Match`] orchestrator, which routes it to the
//! active [`Innings`]. The innings appends to its ball ledger and recomputes
//! its derived state in one transaction; the orchestrator then evaluates
//! cross-innings terminal conditions and updates match status.
//!
//! - [`Innings::apply_ball`] turns one delivery into ledger and total updates
//! - [`Innings::undo_last_ball`] is its exact inverse for the latest delivery
//! - [`Innings::rewind_to`] truncates the ledger and replays the remainder
//! - [`Match`] owns toss, both innings, status transitions and the result

pub mod error;
pub mod innings;
pub mod matches;
pub mod performance;
pub mod result;
pub mod rewind;
pub mod scoring;
pub mod snapshot;
pub mod undo;

pub use error::ScoringError;
pub use innings::{
    BallApplied, Crease, Delivery, FallOfWicket, Innings, InningsStatus, OverCursor, Totals,
};
pub use matches::{BallRecorded, InningsSelector, Match, MatchStatus, Toss, TossDecision};
pub use performance::{
    BattingTally, BowlingTally, FieldingTally, PerformanceBook, PlayerPerformance,
};
pub use result::{Margin, MatchResult, ResultType};
pub use scoring::{score_delivery, DeliveryScore, MAX_RUNS_PARAM};
pub use snapshot::{run_rate, ScoreSnapshot};
pub use undo::BallUndone;
