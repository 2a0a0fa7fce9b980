//! Ball records and the small value types hung off them.
//!
//! A [`Ball`] is immutable once appended. Extras and run breakdowns are
//! plain `Copy` structs so the engine can diff them on undo.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crease_types::PlayerRef;

/// What happened on a single delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallOutcome {
    Dot,
    One,
    Two,
    Three,
    Four,
    Six,
    Wide,
    NoBall,
    Bye,
    LegBye,
    Wicket,
}

impl BallOutcome {
    /// Runs off the bat for the run-scoring outcomes.
    pub fn bat_value(self) -> Option<u32> {
        match self {
            Self::Dot => Some(0),
            Self::One => Some(1),
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Four => Some(4),
            Self::Six => Some(6),
            _ => None,
        }
    }
}

impl fmt::Display for BallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dot => "dot",
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Six => "6",
            Self::Wide => "wide",
            Self::NoBall => "no_ball",
            Self::Bye => "bye",
            Self::LegBye => "leg_bye",
            Self::Wicket => "wicket",
        };
        write!(f, "{s}")
    }
}

impl FromStr for BallOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dot" | "0" | "." => Ok(Self::Dot),
            "1" | "one" => Ok(Self::One),
            "2" | "two" => Ok(Self::Two),
            "3" | "three" => Ok(Self::Three),
            "4" | "four" => Ok(Self::Four),
            "6" | "six" => Ok(Self::Six),
            "wide" | "wd" => Ok(Self::Wide),
            "no_ball" | "noball" | "nb" => Ok(Self::NoBall),
            "bye" | "b" => Ok(Self::Bye),
            "leg_bye" | "legbye" | "lb" => Ok(Self::LegBye),
            "wicket" | "w" => Ok(Self::Wicket),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

/// How a batter was dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalType {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    ObstructingField,
    HandledBall,
}

impl DismissalType {
    /// Dismissals that count toward the bowler's wicket tally.
    pub fn credited_to_bowler(self) -> bool {
        matches!(
            self,
            Self::Bowled | Self::Caught | Self::Lbw | Self::Stumped | Self::HitWicket
        )
    }

    /// A free hit can only be ended by a run out.
    pub fn allowed_on_free_hit(self) -> bool {
        self == Self::RunOut
    }
}

impl fmt::Display for DismissalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bowled => "bowled",
            Self::Caught => "caught",
            Self::Lbw => "lbw",
            Self::RunOut => "run out",
            Self::Stumped => "stumped",
            Self::HitWicket => "hit wicket",
            Self::ObstructingField => "obstructing the field",
            Self::HandledBall => "handled the ball",
        };
        write!(f, "{s}")
    }
}

/// Dismissal detail attached to a wicket delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WicketDetail {
    pub dismissal: Option<DismissalType>,
    pub dismissed: Option<PlayerRef>,
    pub fielder: Option<PlayerRef>,
}

/// Run breakdown of one delivery. `total_runs == batsman_runs + extra_runs`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunsBreakdown {
    pub batsman_runs: u32,
    pub extra_runs: u32,
    pub total_runs: u32,
}

impl RunsBreakdown {
    pub fn new(batsman_runs: u32, extra_runs: u32) -> Self {
        Self {
            batsman_runs,
            extra_runs,
            total_runs: batsman_runs + extra_runs,
        }
    }
}

/// Extras conceded by the fielding side, by bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
}

impl Extras {
    pub fn total(&self) -> u32 {
        self.wides + self.no_balls + self.byes + self.leg_byes
    }

    /// The bucket an outcome's extra runs land in, if any.
    pub fn bucket_mut(&mut self, outcome: BallOutcome) -> Option<&mut u32> {
        match outcome {
            BallOutcome::Wide => Some(&mut self.wides),
            BallOutcome::NoBall => Some(&mut self.no_balls),
            BallOutcome::Bye => Some(&mut self.byes),
            BallOutcome::LegBye => Some(&mut self.leg_byes),
            _ => None,
        }
    }

    pub fn record(&mut self, ball: &Ball) {
        if let Some(bucket) = self.bucket_mut(ball.outcome) {
            *bucket += ball.runs.extra_runs;
        }
    }

    pub fn reverse(&mut self, ball: &Ball) {
        if let Some(bucket) = self.bucket_mut(ball.outcome) {
            *bucket = bucket.saturating_sub(ball.runs.extra_runs);
        }
    }
}

/// One immutable delivery record.
///
/// `over` is 1-based. `ball_in_over` is the number of the legal delivery
/// being attempted (1..=6); wides and no-balls share the number of the legal
/// ball that follows them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub over: u32,
    pub ball_in_over: u32,
    pub bowler: PlayerRef,
    pub striker: PlayerRef,
    pub non_striker: Option<PlayerRef>,
    pub outcome: BallOutcome,
    pub runs: RunsBreakdown,
    pub is_wicket: bool,
    pub wicket: Option<WicketDetail>,
    pub is_legal_delivery: bool,
    pub is_boundary: bool,
    #[serde(default)]
    pub is_free_hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Ball {
    /// Position key used to keep the ledger ordered.
    pub fn position(&self) -> (u32, u32) {
        (self.over, self.ball_in_over)
    }

    /// The dismissed batter, when this delivery took a wicket.
    pub fn dismissed(&self) -> Option<&PlayerRef> {
        self.wicket.as_ref().and_then(|w| w.dismissed.as_ref())
    }

    /// Runs charged to the bowler (everything except byes and leg-byes).
    pub fn bowler_runs(&self) -> u32 {
        match self.outcome {
            BallOutcome::Bye | BallOutcome::LegBye => 0,
            _ => self.runs.total_runs,
        }
    }

    /// Whether the striker is credited with facing this delivery.
    pub fn counts_as_faced(&self) -> bool {
        self.outcome != BallOutcome::Wide
    }

    /// Short scoring notation, e.g. `4`, `1wd`, `2nb`, `W`, `.`.
    pub fn notation(&self) -> String {
        let base = match self.outcome {
            BallOutcome::Wide => format!("{}wd", self.runs.total_runs),
            BallOutcome::NoBall => format!("{}nb", self.runs.total_runs),
            BallOutcome::Bye => format!("{}b", self.runs.extra_runs),
            BallOutcome::LegBye => format!("{}lb", self.runs.extra_runs),
            _ if self.runs.total_runs == 0 && !self.is_wicket => ".".to_string(),
            _ if self.runs.total_runs == 0 => String::new(),
            _ => self.runs.total_runs.to_string(),
        };
        if self.is_wicket {
            format!("{base}W")
        } else {
            base
        }
    }
}
