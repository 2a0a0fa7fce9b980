use thiserror::Error;

/// Errors produced while parsing identities or validating match configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be within {min}..={max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        actual: u32,
    },

    #[error("team name must not be empty")]
    EmptyTeamName,

    #[error("team '{team}' lists {actual} players but {required} are required")]
    ShortRoster {
        team: String,
        required: u32,
        actual: usize,
    },

    #[error("player {0} appears more than once")]
    DuplicatePlayer(String),

    #[error("invalid player reference: {0}")]
    InvalidPlayerRef(String),

    #[error("invalid match id: {0}")]
    InvalidMatchId(String),

    #[error("settings are frozen once the toss is conducted")]
    Frozen,
}
