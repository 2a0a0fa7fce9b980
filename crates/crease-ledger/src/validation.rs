//! Structural checks over a recorded ledger: ordering, over numbering,
//! run arithmetic, legality and wicket detail.

use crease_types::BALLS_PER_OVER;

use crate::ball::{Ball, BallOutcome};

/// Result of validating one innings ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub ball_count: usize,
    pub positions_ordered: bool,
    pub over_numbering_valid: bool,
    pub runs_consistent: bool,
    pub wickets_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific inconsistency found in a ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    OutOfOrder,
    BallNumbering,
    RunsMismatch,
    LegalityMismatch,
    WicketDetailMismatch,
}

/// Structural and arithmetic checks over a ball sequence.
pub struct LedgerValidator;

impl LedgerValidator {
    pub fn validate(balls: &[Ball]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut positions_ordered = true;
        let mut over_numbering_valid = true;
        let mut runs_consistent = true;
        let mut wickets_consistent = true;

        let mut over = 1u32;
        let mut legal_in_over = 0u32;

        for (index, ball) in balls.iter().enumerate() {
            if index > 0 && ball.position() < balls[index - 1].position() {
                positions_ordered = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::OutOfOrder,
                    description: format!(
                        "{}.{} recorded after {}.{}",
                        ball.over,
                        ball.ball_in_over,
                        balls[index - 1].over,
                        balls[index - 1].ball_in_over
                    ),
                });
            }

            if legal_in_over == BALLS_PER_OVER {
                over += 1;
                legal_in_over = 0;
            }
            let expected = (over, legal_in_over + 1);
            if ball.position() != expected {
                over_numbering_valid = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::BallNumbering,
                    description: format!(
                        "expected {}.{}, found {}.{}",
                        expected.0, expected.1, ball.over, ball.ball_in_over
                    ),
                });
                // Resynchronise on the recorded position.
                over = ball.over;
                legal_in_over = ball.ball_in_over.saturating_sub(1);
            }
            if ball.is_legal_delivery {
                legal_in_over += 1;
            }

            if ball.runs.total_runs != ball.runs.batsman_runs + ball.runs.extra_runs {
                runs_consistent = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::RunsMismatch,
                    description: "total runs do not equal batsman plus extra runs".into(),
                });
            }

            let should_be_legal = !matches!(ball.outcome, BallOutcome::Wide | BallOutcome::NoBall);
            if ball.is_legal_delivery != should_be_legal {
                violations.push(Violation {
                    index,
                    kind: ViolationKind::LegalityMismatch,
                    description: format!("{} recorded with wrong legality", ball.outcome),
                });
            }

            let wicket_outcome = ball.outcome == BallOutcome::Wicket;
            if (wicket_outcome && !ball.is_wicket) || ball.is_wicket != ball.wicket.is_some() {
                wickets_consistent = false;
                violations.push(Violation {
                    index,
                    kind: ViolationKind::WicketDetailMismatch,
                    description: "wicket flag and dismissal detail disagree".into(),
                });
            }
        }

        ValidationReport {
            ball_count: balls.len(),
            positions_ordered,
            over_numbering_valid,
            runs_consistent,
            wickets_consistent,
            violations,
        }
    }
}
