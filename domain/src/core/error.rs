//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid scenario '{id}': {reason}")]
    InvalidScenario { id: String, reason: String },

    #[error("Invalid unit transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Tool result for unknown call id: {0}")]
    UnknownToolCall(String),

    #[error("No turn in progress")]
    NoActiveTurn,

    #[error("{0} tool call(s) still awaiting results")]
    UnansweredToolCalls(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    pub(crate) fn invalid_scenario(id: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::InvalidScenario {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
