use crease_ledger::LedgerError;
use crease_types::SettingsError;

/// Errors produced by scoring operations. Every error aborts the operation
/// with no partial mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    /// Illegal state transition or unmet precondition.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced player is not part of the relevant team.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl ScoringError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
