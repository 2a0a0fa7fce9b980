//! Rewinding an innings to an earlier over and ball.
//!
//! The ledger is truncated and the counters are rebuilt by replaying the
//! surviving balls.

use tracing::info;

use crease_ledger::{Ball, LedgerError};

use crate::error::ScoringError;
use crate::innings::{Crease, Innings, InningsStatus, OverCursor};

impl Innings {
    /// Truncate the ledger to its first `len` balls and rebuild every derived
    /// counter by replaying what is left.
    ///
    /// Returns the removed balls, oldest first. Replayed balls keep their
    /// original timestamps and crease positions.
    pub fn rewind_to(&mut self, len: usize) -> Result<Vec<Ball>, ScoringError> {
        let total = self.ledger.len();
        if len > total {
            return Err(LedgerError::InvalidPosition {
                requested: len,
                len: total,
            }
            .into());
        }

        let (kept, removed) = self.ledger.as_slice().split_at(len);
        let opening = self.ledger.get(0).map(Crease::from_ball);
        let mut rebuilt = self.replay(kept)?;
        if kept.is_empty() {
            if let Some(opening) = opening {
                rebuilt.crease = opening;
            }
        }
        let removed = removed.to_vec();

        info!(
            batting = %self.batting,
            kept = len,
            removed = removed.len(),
            "innings rewound"
        );
        *self = rebuilt;
        Ok(removed)
    }

    /// A fresh innings with the same sides, settings and target, fed `balls`.
    fn replay(&self, balls: &[Ball]) -> Result<Innings, ScoringError> {
        let mut innings = Innings::new(self.batting, self.settings);
        innings.target = self.target;
        if self.status != InningsStatus::NotStarted {
            innings.status = InningsStatus::InProgress;
            innings.started_at = self.started_at;
            innings.cursor = OverCursor::default();
        }

        for ball in balls {
            if innings.is_completed() {
                return Err(ScoringError::validation(
                    "ledger continues past the end of the innings",
                ));
            }
            innings.crease = Crease::from_ball(ball);
            innings.commit(ball.clone())?;
        }
        Ok(innings)
    }
}
