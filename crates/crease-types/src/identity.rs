use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SettingsError;

/// Identifier of a single match (UUID v7, so ids sort by creation time).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Generate a fresh, time-ordered match id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        let simple = self.0.simple().to_string();
        format!("m:{}", &simple[..8])
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.short_id())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SettingsError::InvalidMatchId(e.to_string()))
    }
}

/// Stable reference to a player: either a registered account or a named guest.
///
/// Serialized as a plain string: a UUID for registered players, `guest:<name>`
/// for guests. A bare name without the prefix is read as a guest.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlayerRef {
    Registered(Uuid),
    Guest(String),
}

impl PlayerRef {
    pub fn guest(name: impl Into<String>) -> Self {
        Self::Guest(name.into())
    }

    pub fn registered(id: Uuid) -> Self {
        Self::Registered(id)
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

impl fmt::Debug for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerRef({self})")
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(id) => write!(f, "{id}"),
            Self::Guest(name) => write!(f, "guest:{name}"),
        }
    }
}

impl FromStr for PlayerRef {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(name) = trimmed.strip_prefix("guest:") {
            if name.is_empty() {
                return Err(SettingsError::InvalidPlayerRef(s.to_string()));
            }
            return Ok(Self::Guest(name.to_string()));
        }
        if trimmed.is_empty() {
            return Err(SettingsError::InvalidPlayerRef(s.to_string()));
        }
        match Uuid::parse_str(trimmed) {
            Ok(id) => Ok(Self::Registered(id)),
            Err(_) => Ok(Self::Guest(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for PlayerRef {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlayerRef> for String {
    fn from(value: PlayerRef) -> Self {
        value.to_string()
    }
}

/// Caller identity as resolved by the account layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two teams in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "team A"),
            Self::B => write!(f, "team B"),
        }
    }
}
