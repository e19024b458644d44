//! Infrastructure layer for bizeval
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: simulated business tools, model clients and the
//! JSONL result sink. It also owns configuration file loading and the
//! scenario catalog.

pub mod config;
pub mod logging;
pub mod providers;
pub mod scenarios;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileModelConfig, FileOutputConfig,
    FileOutputFormat, FileProviderKind,
};
pub use logging::JsonlResultSink;
pub use providers::{OpenAiCompatClient, OpenAiCompatSettings, ScriptedModelClient};
pub use scenarios::{CatalogError, ScenarioCatalog};
pub use tools::{SimulatedTool, SimulatedTools, ToolDataError, standard_tool_spec};
