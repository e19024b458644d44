//! Configuration file loading for bizeval
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BIZEVAL_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./bizeval.toml` or `./.bizeval.toml`
//! 4. Global: `~/.config/bizeval/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileEvaluationConfig, FileModelConfig, FileOutputConfig,
    FileOutputFormat, FilePerformanceConfig, FileProviderKind, FileScenariosConfig,
    FileSuccessRateConfig, FileToolsConfig, FileWeightsConfig,
};
pub use loader::ConfigLoader;
