//! Scoring service for Crease.
//!
//! Wraps the match engine with the concerns of a multi-caller deployment:
//! at most one mutating call per match at a time, an optimistic version
//! check on every save, a pluggable authorization seam, and event emission
//! once a change has been committed. Reads return shared snapshots and never
//! wait on a scoring call.

pub mod auth;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use auth::{AllowAll, ScoringAction, ScoringAuthority, UmpireOnly};
pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use service::ScoringService;
pub use store::{InMemoryMatchStore, MatchStore};
