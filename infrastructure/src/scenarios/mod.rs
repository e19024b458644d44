//! Scenario loading: built-in scenarios and JSON directories

mod catalog;

pub use catalog::{CatalogError, ScenarioCatalog};
