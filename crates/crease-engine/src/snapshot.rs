use serde::{Deserialize, Serialize};

use crease_types::{MatchId, PlayerRef, BALLS_PER_OVER};

use crate::innings::InningsStatus;
use crate::matches::{InningsSelector, MatchStatus};

/// Runs per over from runs and legal balls, to two decimal places.
/// Zero when no legal ball has been bowled.
pub fn run_rate(runs: u32, legal_balls: u32) -> f64 {
    if legal_balls == 0 {
        return 0.0;
    }
    let overs = f64::from(legal_balls) / f64::from(BALLS_PER_OVER);
    round2(f64::from(runs) / overs)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Live view of the current innings, as broadcast to spectators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub innings: Option<InningsSelector>,
    pub innings_status: Option<InningsStatus>,
    pub batting_team: Option<String>,
    pub runs: u32,
    pub wickets: u32,
    pub overs: u32,
    pub balls: u32,
    pub run_rate: f64,
    pub target: Option<u32>,
    pub runs_needed: Option<u32>,
    pub balls_remaining: Option<u32>,
    pub required_run_rate: Option<f64>,
    pub striker: Option<PlayerRef>,
    pub non_striker: Option<PlayerRef>,
    pub bowler: Option<PlayerRef>,
    pub free_hit: bool,
    pub version: u64,
}

impl ScoreSnapshot {
    /// `142/3 (12.4)` style score line.
    pub fn score_line(&self) -> String {
        format!("{}/{} ({}.{})", self.runs, self.wickets, self.overs, self.balls)
    }

    /// Fill in the chase fields for a second-innings target.
    pub(crate) fn with_chase(mut self, target: u32, balls_remaining: u32) -> Self {
        let needed = target.saturating_sub(self.runs);
        self.target = Some(target);
        self.runs_needed = Some(needed);
        self.balls_remaining = Some(balls_remaining);
        self.required_run_rate = Some(run_rate(needed, balls_remaining));
        self
    }
}
