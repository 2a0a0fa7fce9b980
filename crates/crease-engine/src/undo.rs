//! Reversal of the most recent delivery.

use tracing::info;

use crease_ledger::Ball;
use crease_types::BALLS_PER_OVER;

use crate::error::ScoringError;
use crate::innings::{Innings, InningsStatus};

/// What `undo_last_ball` reversed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallUndone {
    pub ball: Ball,
    /// The removed ball had completed an over.
    pub over_reopened: bool,
    /// The reopened over had been a maiden.
    pub maiden_reversed: bool,
    /// The removed ball had completed the innings.
    pub innings_reopened: bool,
}

impl Innings {
    /// Remove the latest delivery and reverse its effect on totals, extras,
    /// wickets and the over cursor.
    ///
    /// Strike rotation and the bowler cleared at an over boundary are not
    /// restored; the scorer sets the crease again when needed.
    pub fn undo_last_ball(&mut self) -> Result<BallUndone, ScoringError> {
        let Some(last) = self.ledger.last() else {
            return Err(ScoringError::validation("no balls to undo"));
        };
        let over_reopened = last.is_legal_delivery && self.cursor.ball == 0;
        let maiden_reversed =
            over_reopened && self.ledger.over(last.over).all(|b| b.bowler_runs() == 0);

        let ball = self.ledger.pop_last()?;

        self.totals.runs -= ball.runs.total_runs;
        self.extras.reverse(&ball);

        if ball.is_legal_delivery {
            self.totals.balls -= 1;
            if self.cursor.ball == 0 {
                self.totals.overs -= 1;
                self.cursor.over -= 1;
                self.cursor.ball = BALLS_PER_OVER - 1;
            } else {
                self.cursor.ball -= 1;
            }
        }

        if ball.is_wicket {
            self.totals.wickets -= 1;
            if let Some(fall) = self.fall_of_wickets.pop() {
                self.crease.restore(fall.player);
            }
        }

        let innings_reopened = self.status == InningsStatus::Completed;
        if innings_reopened {
            self.status = InningsStatus::InProgress;
            self.ended_at = None;
        }
        self.refresh_run_rate();

        info!(
            over = ball.over,
            ball = ball.ball_in_over,
            outcome = %ball.outcome,
            runs = self.totals.runs,
            "ball undone"
        );

        Ok(BallUndone {
            ball,
            over_reopened,
            maiden_reversed,
            innings_reopened,
        })
    }
}
