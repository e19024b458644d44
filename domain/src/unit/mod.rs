//! Unit-of-work subdomain: one (model, scenario, run) triple, its
//! lifecycle, and what it leaves behind.

pub mod entities;

pub use entities::{RunRecord, UnitFailure, UnitFailureKind, UnitId, UnitStatus};
