//! Deciding the winner and the margin once both innings are over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crease_types::TeamSide;

use crate::innings::Innings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Win,
    Tie,
    Abandoned,
}

/// Winning margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Margin {
    Runs(u32),
    Wickets(u32),
}

impl std::fmt::Display for Margin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (value, unit) = match *self {
            Margin::Runs(n) => (n, "run"),
            Margin::Wickets(n) => (n, "wicket"),
        };
        let plural = if value == 1 { "" } else { "s" };
        write!(f, "{value} {unit}{plural}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub result_type: ResultType,
    pub winner: Option<TeamSide>,
    pub margin: Option<Margin>,
    pub reason: Option<String>,
    pub summary: String,
    pub decided_at: DateTime<Utc>,
}

impl MatchResult {
    /// Decide a finished match from its two innings. `team_name` resolves a
    /// side to its display name for the summary line.
    pub fn decide<'a>(
        first: &Innings,
        second: &Innings,
        team_name: impl Fn(TeamSide) -> &'a str,
    ) -> Self {
        let defended = first.totals().runs;
        let chased = second.totals().runs;
        let max_wickets = second.settings().max_wickets();

        let (result_type, winner, margin) = if chased > defended {
            let wickets_left = max_wickets.saturating_sub(second.totals().wickets);
            (
                ResultType::Win,
                Some(second.batting_team()),
                Some(Margin::Wickets(wickets_left)),
            )
        } else if defended > chased {
            (
                ResultType::Win,
                Some(first.batting_team()),
                Some(Margin::Runs(defended - chased)),
            )
        } else {
            (ResultType::Tie, None, None)
        };

        let summary = match (winner, margin) {
            (Some(side), Some(margin)) => format!("{} won by {margin}", team_name(side)),
            _ => "Match tied".to_string(),
        };

        Self {
            result_type,
            winner,
            margin,
            reason: None,
            summary,
            decided_at: Utc::now(),
        }
    }

    pub fn abandoned(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            result_type: ResultType::Abandoned,
            winner: None,
            margin: None,
            summary: format!("Match abandoned: {reason}"),
            reason: Some(reason),
            decided_at: Utc::now(),
        }
    }
}
