//! Application-level configuration.
//!
//! - [`EvaluationConfig`]: scheduling, timeouts, weights and failure injection
//! - [`ConfigError`]: fail-fast validation errors

pub mod evaluation;

pub use evaluation::{ConfigError, EvaluationConfig};
