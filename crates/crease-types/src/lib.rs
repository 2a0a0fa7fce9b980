//! Foundation types for Crease.
//!
//! This crate provides the identity and configuration types shared by every
//! other Crease crate.
//!
//! # Key Types
//!
//! - [`MatchId`]: UUID v7 match identifier
//! - [`PlayerRef`]: Stable reference to a registered or guest player
//! - [`AccountId`]: Caller identity supplied by the account layer
//! - [`TeamSide`]: One of the two teams in a match
//! - [`MatchSettings`]: Frozen playing conditions (overs, roster size, extras)
//! - [`MatchConfig`]: Inbound configuration consumed once at match creation

pub mod error;
pub mod identity;
pub mod settings;

pub use error::SettingsError;
pub use identity::{AccountId, MatchId, PlayerRef, TeamSide};
pub use settings::{MatchConfig, MatchSettings, TeamRoster, BALLS_PER_OVER};
