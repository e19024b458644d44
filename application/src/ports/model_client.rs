//! Model client port
//!
//! Defines the interface for requesting responses from a model under
//! evaluation.

use async_trait::async_trait;
use bizeval_domain::{Message, ModelId, ModelResponse, ToolDefinition};
use thiserror::Error;

/// Errors a model client can raise.
///
/// Any of these ends the unit in `FAILED`; the driver never retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Client for one model under evaluation
///
/// `generate` must be safe to call repeatedly within one turn's tool-call
/// loop. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier used in run records and reports
    fn id(&self) -> &ModelId;

    /// Request a response over the full history with the given tools on offer
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError>;
}
