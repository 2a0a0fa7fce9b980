//! Append-only sequence of balls for one innings.

use serde::{Deserialize, Serialize};

use crate::ball::Ball;
use crate::error::LedgerError;

/// Ordered, append-only sequence of deliveries for one innings.
///
/// `append` and `pop_last` are the only mutators. The ledger keeps balls in
/// position order but does not judge cricket semantics; that belongs to the
/// innings engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallLedger {
    balls: Vec<Ball>,
}

impl BallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully formed delivery. Fails if it would precede the tail.
    pub fn append(&mut self, ball: Ball) -> Result<&Ball, LedgerError> {
        if let Some(tail) = self.balls.last() {
            if ball.position() < tail.position() {
                return Err(LedgerError::OutOfOrder {
                    over: ball.over,
                    ball: ball.ball_in_over,
                    tail_over: tail.over,
                    tail_ball: tail.ball_in_over,
                });
            }
        }
        self.balls.push(ball);
        let index = self.balls.len() - 1;
        Ok(&self.balls[index])
    }

    /// Remove and return the most recent delivery.
    pub fn pop_last(&mut self) -> Result<Ball, LedgerError> {
        self.balls.pop().ok_or(LedgerError::EmptyLedger)
    }

    pub fn last(&self) -> Option<&Ball> {
        self.balls.last()
    }

    pub fn get(&self, index: usize) -> Option<&Ball> {
        self.balls.get(index)
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ball> {
        self.balls.iter()
    }

    pub fn as_slice(&self) -> &[Ball] {
        &self.balls
    }

    /// Deliveries bowled in the given 1-based over.
    pub fn over(&self, over: u32) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(move |b| b.over == over)
    }

    pub fn total_runs(&self) -> u32 {
        self.balls.iter().map(|b| b.runs.total_runs).sum()
    }

    pub fn legal_balls(&self) -> u32 {
        self.balls.iter().filter(|b| b.is_legal_delivery).count() as u32
    }

    pub fn wickets(&self) -> u32 {
        self.balls.iter().filter(|b| b.is_wicket).count() as u32
    }
}

impl<'a> IntoIterator for &'a BallLedger {
    type Item = &'a Ball;
    type IntoIter = std::slice::Iter<'a, Ball>;

    fn into_iter(self) -> Self::IntoIter {
        self.balls.iter()
    }
}
