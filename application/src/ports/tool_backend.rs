//! Tool backend port
//!
//! Defines the interface the dispatcher calls once a tool call has passed
//! lookup, parameter validation and failure injection.

use async_trait::async_trait;
use bizeval_domain::{ToolOutcome, ToolSpec};
use serde_json::{Map, Value};

/// Port for tool execution
///
/// Errors are returned as [`ToolOutcome`] values, never raised: a tool
/// failure is something the model under evaluation must handle.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Definitions of every tool this backend can execute
    fn definitions(&self) -> &ToolSpec;

    /// Check if a tool is available
    fn has_tool(&self, tool_id: &str) -> bool {
        self.definitions().contains(tool_id)
    }

    /// Execute a tool with already-validated parameters
    async fn execute(&self, tool_id: &str, parameters: &Map<String, Value>) -> ToolOutcome;
}
