//! Application layer for bizeval
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConfigError, EvaluationConfig};
pub use ports::{
    model_client::{GatewayError, ModelClient},
    progress::{NoProgress, PipelineProgress},
    result_sink::{NoResultSink, ResultSink},
    tool_backend::ToolBackend,
};
pub use use_cases::dispatch_tool::{FailureInjector, ToolDispatcher, UnitInjector};
pub use use_cases::drive_conversation::{ConversationDriver, DriveError};
pub use use_cases::run_evaluation::{EvaluationPipeline, PipelineOutput};
