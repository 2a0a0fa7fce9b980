//! Read-only views computed from a slice of balls: summaries, overs and
//! per-batter and per-bowler lines.

use crease_types::{PlayerRef, BALLS_PER_OVER};
use serde::{Deserialize, Serialize};

use crate::ball::{Ball, BallOutcome, Extras};

/// Totals recomputed from the ledger alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    pub extras: Extras,
}

impl LedgerSummary {
    pub fn completed_overs(&self) -> u32 {
        self.legal_balls / BALLS_PER_OVER
    }

    pub fn balls_in_over(&self) -> u32 {
        self.legal_balls % BALLS_PER_OVER
    }
}

/// One batter's line on the scorecard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterCard {
    pub player: PlayerRef,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub out: bool,
}

impl BatterCard {
    fn new(player: PlayerRef) -> Self {
        Self {
            player,
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            out: false,
        }
    }

    pub fn strike_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            return 0.0;
        }
        round2(self.runs as f64 * 100.0 / self.balls_faced as f64)
    }
}

/// One bowler's line on the scorecard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerCard {
    pub player: PlayerRef,
    pub legal_balls: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub maidens: u32,
}

impl BowlerCard {
    fn new(player: PlayerRef) -> Self {
        Self {
            player,
            legal_balls: 0,
            runs_conceded: 0,
            wickets: 0,
            wides: 0,
            no_balls: 0,
            maidens: 0,
        }
    }

    /// Overs bowled in `overs.balls` notation.
    pub fn overs(&self) -> String {
        format!(
            "{}.{}",
            self.legal_balls / BALLS_PER_OVER,
            self.legal_balls % BALLS_PER_OVER
        )
    }

    pub fn economy(&self) -> f64 {
        if self.legal_balls == 0 {
            return 0.0;
        }
        round2(self.runs_conceded as f64 * BALLS_PER_OVER as f64 / self.legal_balls as f64)
    }
}

/// Runs and wickets in a single over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverSummary {
    pub over: u32,
    pub bowler: PlayerRef,
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    pub deliveries: Vec<String>,
}

impl OverSummary {
    pub fn is_complete(&self) -> bool {
        self.legal_balls == BALLS_PER_OVER
    }

    pub fn is_maiden(&self, balls: &[&Ball]) -> bool {
        self.is_complete() && balls.iter().all(|b| b.bowler_runs() == 0)
    }
}

/// Full ledger-derived scorecard for one innings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub summary: LedgerSummary,
    pub batters: Vec<BatterCard>,
    pub bowlers: Vec<BowlerCard>,
    pub overs: Vec<OverSummary>,
}

/// Deterministic projections over a ball sequence.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    pub fn summary(balls: &[Ball]) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for ball in balls {
            summary.runs += ball.runs.total_runs;
            if ball.is_wicket {
                summary.wickets += 1;
            }
            if ball.is_legal_delivery {
                summary.legal_balls += 1;
            }
            summary.extras.record(ball);
        }
        summary
    }

    pub fn scorecard(balls: &[Ball]) -> Scorecard {
        let mut batters: Vec<BatterCard> = Vec::new();
        let mut bowlers: Vec<BowlerCard> = Vec::new();

        for ball in balls {
            let batter = card_for(&mut batters, &ball.striker, BatterCard::new);
            batter.runs += ball.runs.batsman_runs;
            if ball.counts_as_faced() {
                batter.balls_faced += 1;
            }
            match ball.runs.batsman_runs {
                4 if ball.is_boundary => batter.fours += 1,
                6 if ball.is_boundary => batter.sixes += 1,
                _ => {}
            }
            if let Some(non_striker) = &ball.non_striker {
                card_for(&mut batters, non_striker, BatterCard::new);
            }
            if let Some(dismissed) = ball.dismissed() {
                card_for(&mut batters, dismissed, BatterCard::new).out = true;
            }

            let bowler = card_for(&mut bowlers, &ball.bowler, BowlerCard::new);
            if ball.is_legal_delivery {
                bowler.legal_balls += 1;
            }
            bowler.runs_conceded += ball.bowler_runs();
            match ball.outcome {
                BallOutcome::Wide => bowler.wides += 1,
                BallOutcome::NoBall => bowler.no_balls += 1,
                _ => {}
            }
            let credited = ball
                .wicket
                .as_ref()
                .and_then(|w| w.dismissal)
                .map(|d| d.credited_to_bowler())
                .unwrap_or(ball.outcome == BallOutcome::Wicket);
            if ball.is_wicket && credited {
                bowler.wickets += 1;
            }
        }

        let overs = Self::overs(balls);
        for over in &overs {
            let deliveries: Vec<&Ball> = balls.iter().filter(|b| b.over == over.over).collect();
            if over.is_maiden(&deliveries) {
                card_for(&mut bowlers, &over.bowler, BowlerCard::new).maidens += 1;
            }
        }

        Scorecard {
            summary: Self::summary(balls),
            batters,
            bowlers,
            overs,
        }
    }

    pub fn overs(balls: &[Ball]) -> Vec<OverSummary> {
        let mut overs: Vec<OverSummary> = Vec::new();
        for ball in balls {
            let start_new = overs.last().map(|o| o.over != ball.over).unwrap_or(true);
            if start_new {
                overs.push(OverSummary {
                    over: ball.over,
                    bowler: ball.bowler.clone(),
                    runs: 0,
                    wickets: 0,
                    legal_balls: 0,
                    deliveries: Vec::new(),
                });
            }
            if let Some(current) = overs.last_mut() {
                current.runs += ball.runs.total_runs;
                if ball.is_wicket {
                    current.wickets += 1;
                }
                if ball.is_legal_delivery {
                    current.legal_balls += 1;
                }
                current.deliveries.push(ball.notation());
            }
        }
        overs
    }
}

trait Carded {
    fn player(&self) -> &PlayerRef;
}

impl Carded for BatterCard {
    fn player(&self) -> &PlayerRef {
        &self.player
    }
}

impl Carded for BowlerCard {
    fn player(&self) -> &PlayerRef {
        &self.player
    }
}

fn card_for<'a, C: Carded>(
    cards: &'a mut Vec<C>,
    player: &PlayerRef,
    make: fn(PlayerRef) -> C,
) -> &'a mut C {
    let index = match cards.iter().position(|c| c.player() == player) {
        Some(index) => index,
        None => {
            cards.push(make(player.clone()));
            cards.len() - 1
        }
    };
    &mut cards[index]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
