//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types by
//! [`FileConfig::to_evaluation_config`].

mod evaluation;
mod models;
mod output;
mod scoring;
mod tools;

pub use evaluation::FileEvaluationConfig;
pub use models::{FileModelConfig, FileProviderKind};
pub use output::{FileOutputConfig, FileOutputFormat, FileScenariosConfig};
pub use scoring::{
    FilePerformanceConfig, FileSuccessRateConfig, FileWeightsConfig, parse_weights,
};
pub use tools::FileToolsConfig;

use bizeval_application::EvaluationConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Errors in the raw file configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("evaluation.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("models: model id cannot be empty")]
    EmptyModelId,

    #[error("models: duplicate model id '{0}'")]
    DuplicateModelId(String),

    #[error("weights: unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("performance: floors must be below ceilings")]
    InvalidPerformance,

    #[error("success_rate: {0}")]
    InvalidSuccessPolicy(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub evaluation: FileEvaluationConfig,
    pub weights: FileWeightsConfig,
    pub tools: FileToolsConfig,
    pub performance: FilePerformanceConfig,
    pub success_rate: FileSuccessRateConfig,
    pub models: Vec<FileModelConfig>,
    pub scenarios: FileScenariosConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Check what the file layer can check on its own.
    ///
    /// Ranges of runs, concurrency and error rates are checked by the
    /// pipeline together with the models and scenarios.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.evaluation.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        let mut seen = BTreeSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() {
                return Err(ConfigValidationError::EmptyModelId);
            }
            if !seen.insert(model.id.as_str()) {
                return Err(ConfigValidationError::DuplicateModelId(model.id.clone()));
            }
        }

        if let Some(name) = self
            .weights
            .keys()
            .find(|name| name.parse::<bizeval_domain::Dimension>().is_ok_and(|d| !d.is_builtin()))
        {
            return Err(ConfigValidationError::UnknownDimension(name.clone()));
        }

        self.performance.to_thresholds()?;
        self.success_rate.to_policy()?;
        Ok(())
    }

    /// Convert into the pipeline's evaluation parameters
    pub fn to_evaluation_config(&self) -> Result<EvaluationConfig, ConfigValidationError> {
        self.validate()?;
        Ok(EvaluationConfig {
            runs: self.evaluation.runs,
            concurrency: self.evaluation.concurrency,
            unit_timeout: Duration::from_secs(self.evaluation.timeout_seconds),
            max_tool_calls_per_turn: self.evaluation.max_tool_calls_per_turn,
            weights: parse_weights(&self.weights),
            tool_error_rates: self.tools.error_rates.clone(),
            seed: self.tools.seed,
            success_rate: self.success_rate.to_policy()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizeval_domain::{Dimension, SuccessRatePolicy};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[evaluation]
runs = 5
concurrency = 2
timeout_seconds = 60

[weights]
response_quality = 0.3
business_value = 0.2
communication_style = 0.2
tool_usage = 0.2
performance = 0.1

[tools]
seed = 7

[tools.error_rates]
scheduler = 0.25

[performance]
latency_floor_ms = 1000

[success_rate]
policy = "adjusted_base_rate"
base_rate = 0.6

[[models]]
id = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"

[[models]]
id = "dry"
provider = "scripted"

[scenarios]
select = ["product_inquiry"]

[output]
format = "json"
color = false
results_path = "out/results.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[1].provider, FileProviderKind::Scripted);
        assert_eq!(config.models[0].model_name(), "gpt-4o-mini");
        assert_eq!(config.output.format, FileOutputFormat::Json);
        assert_eq!(config.scenarios.select, vec!["product_inquiry"]);
        assert!(config.scenarios.include_builtin);

        let evaluation = config.to_evaluation_config().unwrap();
        assert_eq!(evaluation.runs, 5);
        assert_eq!(evaluation.concurrency, 2);
        assert_eq!(evaluation.unit_timeout, Duration::from_secs(60));
        assert_eq!(evaluation.seed, 7);
        assert_eq!(evaluation.tool_error_rates.get("scheduler"), Some(&0.25));
        assert_eq!(evaluation.weights.get(&Dimension::ResponseQuality), Some(&0.3));
        assert!(matches!(
            evaluation.success_rate,
            SuccessRatePolicy::AdjustedBaseRate { base_rate, .. } if base_rate == 0.6
        ));
        assert_eq!(
            config.performance.to_thresholds().unwrap().latency_floor_ms,
            1000
        );
    }

    #[test]
    fn test_defaults_match_evaluation_defaults() {
        let evaluation = FileConfig::default().to_evaluation_config().unwrap();
        assert_eq!(evaluation, EvaluationConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = FileConfig::default();
        config.evaluation.timeout_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));

        let mut config = FileConfig::default();
        config.models = vec![FileModelConfig::new("a"), FileModelConfig::new("a")];
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateModelId("a".into()))
        );

        let mut config = FileConfig::default();
        config.weights.insert("charisma".into(), 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnknownDimension(_))
        ));

        let mut config = FileConfig::default();
        config.performance.latency_floor_ms = Some(20_000);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidPerformance)
        );

        let mut config = FileConfig::default();
        config.success_rate.policy = "vibes".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidSuccessPolicy(_))
        ));
    }
}
