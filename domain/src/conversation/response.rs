//! Model response value objects

use crate::tool::entities::ToolCall;
use crate::tool::value_objects::duration_millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// One reply from the model capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(with = "duration_millis")]
    pub latency: Duration,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl ModelResponse {
    /// A turn-final text reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// A reply requesting tool calls
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn metrics(&self) -> ResponseMetrics {
        ResponseMetrics {
            latency: self.latency,
            usage: self.usage,
            tool_calls: self.tool_calls.len(),
        }
    }
}

/// Latency and token metadata of one model call, kept per turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    #[serde(with = "duration_millis")]
    pub latency: Duration,
    pub usage: TokenUsage,
    pub tool_calls: usize,
}
