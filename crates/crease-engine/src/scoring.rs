//! The outcome table: runs, legality and boundaries for each delivery.

use crease_ledger::{BallOutcome, RunsBreakdown};
use crease_types::MatchSettings;

use crate::error::ScoringError;

/// Largest runs parameter accepted with a delivery.
pub const MAX_RUNS_PARAM: u32 = 6;

/// Run arithmetic and legality of one delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryScore {
    pub runs: RunsBreakdown,
    pub is_legal: bool,
    pub is_boundary: bool,
}

/// Apply the outcome table to a delivery.
///
/// `runs_param` is the runs taken off a wide, no-ball, bye or leg-bye; it is
/// ignored for outcomes whose value is fixed. Byes and leg-byes default to a
/// single run when `runs_param` is zero.
pub fn score_delivery(
    outcome: BallOutcome,
    runs_param: u32,
    settings: &MatchSettings,
) -> Result<DeliveryScore, ScoringError> {
    if runs_param > MAX_RUNS_PARAM {
        return Err(ScoringError::validation(format!(
            "runs must be between 0 and {MAX_RUNS_PARAM}, got {runs_param}"
        )));
    }

    let (batsman_runs, extra_runs, is_legal, is_boundary) = match outcome {
        BallOutcome::Dot => (0, 0, true, false),
        BallOutcome::One => (1, 0, true, false),
        BallOutcome::Two => (2, 0, true, false),
        BallOutcome::Three => (3, 0, true, false),
        BallOutcome::Four => (4, 0, true, true),
        BallOutcome::Six => (6, 0, true, true),
        BallOutcome::Wide => (0, settings.wide_runs + runs_param, false, false),
        BallOutcome::NoBall => (runs_param, settings.no_ball_runs, false, false),
        BallOutcome::Bye | BallOutcome::LegBye => (0, runs_param.max(1), true, false),
        BallOutcome::Wicket => (0, 0, true, false),
    };

    Ok(DeliveryScore {
        runs: RunsBreakdown::new(batsman_runs, extra_runs),
        is_legal,
        is_boundary,
    })
}
