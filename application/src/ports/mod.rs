//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod model_client;
pub mod progress;
pub mod result_sink;
pub mod tool_backend;
