//! Event fabric for Crease.
//!
//! Scoring events are stamped with a per-fabric sequence number, kept in a
//! bounded history for late subscribers, and fanned out to every subscriber
//! whose filter matches. Events are emitted only after the match state that
//! produced them has been committed.

pub mod error;
pub mod event;
pub mod fabric;

pub use error::FabricError;
pub use event::{EventKind, EventPayload, ScoreEvent};
pub use fabric::{EventFabric, EventFilter, EventStream, FabricConfig};
