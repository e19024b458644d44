//! Evaluation configuration from TOML (`[evaluation]` section)

use serde::{Deserialize, Serialize};

/// Raw scheduling parameters
///
/// ```toml
/// [evaluation]
/// runs = 5
/// concurrency = 8
/// timeout_seconds = 300
/// max_tool_calls_per_turn = 8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEvaluationConfig {
    pub runs: usize,
    pub concurrency: usize,
    /// Wall-clock ceiling for one unit
    pub timeout_seconds: u64,
    pub max_tool_calls_per_turn: usize,
    /// Optional system prompt for scenarios that don't define one
    pub system_prompt: Option<String>,
}

impl Default for FileEvaluationConfig {
    fn default() -> Self {
        Self {
            runs: 1,
            concurrency: 4,
            timeout_seconds: 300,
            max_tool_calls_per_turn: 8,
            system_prompt: None,
        }
    }
}
