//! Who may score a match. The service asks a [`ScoringAuthority`] before
//! every mutation.

use async_trait::async_trait;

use crease_engine::Match;
use crease_types::AccountId;

use crate::error::ServiceResult;

/// A mutating call on a match, as presented for authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringAction {
    AmendSettings,
    Toss,
    Score,
    Undo,
    Abandon,
    Cancel,
}

impl std::fmt::Display for ScoringAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AmendSettings => "amend settings of",
            Self::Toss => "conduct the toss of",
            Self::Score => "score",
            Self::Undo => "undo a ball in",
            Self::Abandon => "abandon",
            Self::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Decides whether a caller may perform an action on a match right now.
#[async_trait]
pub trait ScoringAuthority: Send + Sync {
    async fn authorize(
        &self,
        caller: &AccountId,
        game: &Match,
        action: ScoringAction,
    ) -> ServiceResult<bool>;
}

/// Permits everything. For local play and tests.
pub struct AllowAll;

#[async_trait]
impl ScoringAuthority for AllowAll {
    async fn authorize(
        &self,
        _caller: &AccountId,
        _game: &Match,
        _action: ScoringAction,
    ) -> ServiceResult<bool> {
        Ok(true)
    }
}

/// Only the umpire named in the match configuration may act.
pub struct UmpireOnly;

#[async_trait]
impl ScoringAuthority for UmpireOnly {
    async fn authorize(
        &self,
        caller: &AccountId,
        game: &Match,
        _action: ScoringAction,
    ) -> ServiceResult<bool> {
        Ok(game.umpire() == caller)
    }
}
