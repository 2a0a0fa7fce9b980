use thiserror::Error;

use crease_engine::ScoringError;
use crease_fabric::FabricError;
use crease_types::{AccountId, MatchId};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("authorization denied: {account} may not {action} match {id}")]
    Unauthorized {
        id: MatchId,
        account: AccountId,
        action: String,
    },

    #[error("version conflict on match {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: MatchId,
        expected: u64,
        actual: u64,
    },

    #[error("match store is full ({0} matches)")]
    CapacityExceeded(usize),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("fabric error: {0}")]
    Fabric(#[from] FabricError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable classification of service errors for callers and transports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MatchNotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::VersionConflict { .. } | Self::CapacityExceeded(_) => ErrorKind::Conflict,
            Self::Scoring(ScoringError::NotFound(_)) => ErrorKind::NotFound,
            Self::Scoring(_) => ErrorKind::Validation,
            Self::Fabric(_) | Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
