//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelId`] : identifier of a model under evaluation
//! - [`error::DomainError`] : domain-level errors
//! - [`string`] : truncation and stable hashing helpers

pub mod error;
pub mod model;
pub mod string;
