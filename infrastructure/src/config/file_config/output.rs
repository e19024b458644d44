//! Output configuration from TOML (`[output]` and `[scenarios]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report format printed at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for FileOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FileOutputFormat::Text),
            "json" => Ok(FileOutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: FileOutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show a progress bar while units run
    pub progress: bool,
    /// JSONL file receiving run, failure and aggregate records
    pub results_path: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: FileOutputFormat::Text,
            color: true,
            progress: true,
            results_path: None,
        }
    }
}

/// Scenario selection
///
/// ```toml
/// [scenarios]
/// directory = "./scenarios"
/// include_builtin = false
/// select = ["product_inquiry"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileScenariosConfig {
    /// Directory of additional `*.json` scenarios
    pub directory: Option<PathBuf>,
    pub include_builtin: bool,
    /// Scenario ids to run (empty = all)
    pub select: Vec<String>,
}

impl Default for FileScenariosConfig {
    fn default() -> Self {
        Self {
            directory: None,
            include_builtin: true,
            select: Vec::new(),
        }
    }
}
