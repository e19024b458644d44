//! Scoring configuration from TOML (`[weights]`, `[performance]` and
//! `[success_rate]` sections)

use super::ConfigValidationError;
use bizeval_domain::{Dimension, PerformanceThresholds, SuccessRatePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dimension weight overrides, keyed by dimension name
///
/// ```toml
/// [weights]
/// response_quality = 0.3
/// business_value = 0.3
/// communication_style = 0.15
/// tool_usage = 0.15
/// performance = 0.1
/// ```
pub type FileWeightsConfig = BTreeMap<String, f64>;

/// Parse weight keys into dimensions
pub fn parse_weights(weights: &FileWeightsConfig) -> BTreeMap<Dimension, f64> {
    weights
        .iter()
        .filter_map(|(name, weight)| Some((name.parse().ok()?, *weight)))
        .collect()
}

/// Performance thresholds for a medium-complexity scenario; unset fields
/// keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePerformanceConfig {
    pub latency_floor_ms: Option<u64>,
    pub latency_ceiling_ms: Option<u64>,
    pub completion_tokens_floor: Option<u32>,
    pub completion_tokens_ceiling: Option<u32>,
}

impl FilePerformanceConfig {
    pub fn to_thresholds(&self) -> Result<PerformanceThresholds, ConfigValidationError> {
        let defaults = PerformanceThresholds::default();
        let thresholds = PerformanceThresholds {
            latency_floor_ms: self.latency_floor_ms.unwrap_or(defaults.latency_floor_ms),
            latency_ceiling_ms: self
                .latency_ceiling_ms
                .unwrap_or(defaults.latency_ceiling_ms),
            completion_tokens_floor: self
                .completion_tokens_floor
                .unwrap_or(defaults.completion_tokens_floor),
            completion_tokens_ceiling: self
                .completion_tokens_ceiling
                .unwrap_or(defaults.completion_tokens_ceiling),
        };
        if thresholds.is_valid() {
            Ok(thresholds)
        } else {
            Err(ConfigValidationError::InvalidPerformance)
        }
    }
}

/// Success-rate policy selection
///
/// ```toml
/// [success_rate]
/// policy = "adjusted_base_rate"
/// base_rate = 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSuccessRateConfig {
    /// `"threshold"` or `"adjusted_base_rate"`
    pub policy: String,
    pub threshold: f64,
    pub base_rate: f64,
    pub pivot: f64,
    pub slope: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for FileSuccessRateConfig {
    fn default() -> Self {
        Self {
            policy: "threshold".to_string(),
            threshold: 0.7,
            base_rate: 0.8,
            pivot: 0.75,
            slope: 0.3,
            floor: 0.1,
            ceiling: 0.95,
        }
    }
}

impl FileSuccessRateConfig {
    pub fn to_policy(&self) -> Result<SuccessRatePolicy, ConfigValidationError> {
        let policy = match self.policy.trim().to_lowercase().replace('-', "_").as_str() {
            "threshold" => SuccessRatePolicy::Threshold {
                threshold: self.threshold,
            },
            "adjusted_base_rate" => SuccessRatePolicy::AdjustedBaseRate {
                base_rate: self.base_rate,
                pivot: self.pivot,
                slope: self.slope,
                floor: self.floor,
                ceiling: self.ceiling,
            },
            other => {
                return Err(ConfigValidationError::InvalidSuccessPolicy(format!(
                    "unknown policy '{}'",
                    other
                )));
            }
        };
        policy
            .validate()
            .map_err(ConfigValidationError::InvalidSuccessPolicy)?;
        Ok(policy)
    }
}
