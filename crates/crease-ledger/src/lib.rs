//! Append-only ball ledger for Crease.
//!
//! The ledger is the source of truth for every derived number in an innings.
//! This crate provides:
//! - The immutable [`Ball`] delivery record and its outcome taxonomy
//! - [`BallLedger`], an ordered append / pop-tail sequence
//! - [`LedgerValidator`] for structural and arithmetic consistency checks
//! - [`ProjectionBuilder`] for ledger-derived summaries and scorecards

pub mod ball;
pub mod error;
pub mod ledger;
pub mod projection;
pub mod validation;

pub use ball::{Ball, BallOutcome, DismissalType, Extras, RunsBreakdown, WicketDetail};
pub use error::LedgerError;
pub use ledger::BallLedger;
pub use projection::{
    BatterCard, BowlerCard, LedgerSummary, OverSummary, ProjectionBuilder, Scorecard,
};
pub use validation::{LedgerValidator, ValidationReport, Violation, ViolationKind};
