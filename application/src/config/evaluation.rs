//! Evaluation parameters: pipeline scheduling and failure injection.
//!
//! [`EvaluationConfig`] groups everything the pipeline consumes besides the
//! models, scenarios, tools and evaluator table. It is validated as a whole
//! by [`EvaluationPipeline::new`](crate::use_cases::run_evaluation::EvaluationPipeline::new)
//! before any unit of work starts.

use bizeval_domain::{Dimension, ModelId, SuccessRatePolicy, WeightError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
///
/// Any of these aborts the whole invocation; no unit is started and no
/// partial result is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No models configured")]
    NoModels,

    #[error("No scenarios selected")]
    NoScenarios,

    #[error("Duplicate model id: {0}")]
    DuplicateModel(ModelId),

    #[error("Duplicate scenario id: {0}")]
    DuplicateScenario(String),

    #[error("Run count must be at least 1, got {0}")]
    InvalidRuns(usize),

    #[error("Concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("Unit timeout must be positive")]
    InvalidTimeout,

    #[error("Per-turn tool call limit must be at least 1, got {0}")]
    InvalidToolCallLimit(usize),

    #[error("Error rate for tool '{tool}' must be within [0, 1], got {rate}")]
    InvalidErrorRate { tool: String, rate: f64 },

    #[error("Unknown tool '{tool}' referenced by {source_name}")]
    UnknownTool { tool: String, source_name: String },

    #[error("Invalid weights: {0}")]
    Weights(#[from] WeightError),

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    #[error("Invalid success-rate policy: {0}")]
    SuccessPolicy(String),
}

/// Pipeline-level evaluation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Repetitions per (model, scenario) pair
    pub runs: usize,
    /// Units allowed to run at once; 1 runs everything sequentially
    pub concurrency: usize,
    /// Wall-clock ceiling for driving one unit's conversation; scoring
    /// happens after the deadline and is not counted against it
    pub unit_timeout: Duration,
    /// Tool calls dispatched per scripted turn before the turn is cut off
    pub max_tool_calls_per_turn: usize,
    /// Dimension weight overrides applied on top of the evaluator table
    pub weights: BTreeMap<Dimension, f64>,
    /// Failure probability per tool id
    pub tool_error_rates: BTreeMap<String, f64>,
    /// Base seed for failure injection
    pub seed: u64,
    pub success_rate: SuccessRatePolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            runs: 1,
            concurrency: 4,
            unit_timeout: Duration::from_secs(300),
            max_tool_calls_per_turn: 8,
            weights: BTreeMap::new(),
            tool_error_rates: BTreeMap::new(),
            seed: 42,
            success_rate: SuccessRatePolicy::default(),
        }
    }
}

impl EvaluationConfig {
    // ==================== Builder Methods ====================

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = timeout;
        self
    }

    pub fn with_max_tool_calls_per_turn(mut self, max: usize) -> Self {
        self.max_tool_calls_per_turn = max;
        self
    }

    pub fn with_weight(mut self, dimension: Dimension, weight: f64) -> Self {
        self.weights.insert(dimension, weight);
        self
    }

    pub fn with_error_rate(mut self, tool: impl Into<String>, rate: f64) -> Self {
        self.tool_error_rates.insert(tool.into(), rate);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_success_rate(mut self, policy: SuccessRatePolicy) -> Self {
        self.success_rate = policy;
        self
    }

    /// Check the scalar parameters.
    ///
    /// Weights and tool ids are checked by the pipeline against the
    /// evaluator table and tool backend it is built with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::InvalidRuns(self.runs));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        if self.unit_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.max_tool_calls_per_turn == 0 {
            return Err(ConfigError::InvalidToolCallLimit(self.max_tool_calls_per_turn));
        }
        if let Some((tool, rate)) = self
            .tool_error_rates
            .iter()
            .find(|(_, rate)| !(0.0..=1.0).contains(*rate))
        {
            return Err(ConfigError::InvalidErrorRate {
                tool: tool.clone(),
                rate: *rate,
            });
        }
        self.success_rate
            .validate()
            .map_err(ConfigError::SuccessPolicy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EvaluationConfig::default();
        assert_eq!(config.runs, 1);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_tool_calls_per_turn, 8);
        assert!(config.weights.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EvaluationConfig::default()
            .with_runs(3)
            .with_concurrency(1)
            .with_error_rate("scheduler", 0.5)
            .with_seed(7);

        assert_eq!(config.runs, 3);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.tool_error_rates.get("scheduler"), Some(&0.5));
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_rejects_non_positive_counts() {
        assert_eq!(
            EvaluationConfig::default().with_runs(0).validate(),
            Err(ConfigError::InvalidRuns(0))
        );
        assert_eq!(
            EvaluationConfig::default().with_concurrency(0).validate(),
            Err(ConfigError::InvalidConcurrency(0))
        );
        assert_eq!(
            EvaluationConfig::default()
                .with_unit_timeout(Duration::ZERO)
                .validate(),
            Err(ConfigError::InvalidTimeout)
        );
        assert_eq!(
            EvaluationConfig::default()
                .with_max_tool_calls_per_turn(0)
                .validate(),
            Err(ConfigError::InvalidToolCallLimit(0))
        );
    }

    #[test]
    fn test_rejects_out_of_range_error_rate() {
        let err = EvaluationConfig::default()
            .with_error_rate("knowledge_base", 1.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidErrorRate { rate, .. } if rate == 1.5));
    }
}
