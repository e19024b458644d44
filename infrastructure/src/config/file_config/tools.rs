//! Tools configuration from TOML (`[tools]` section)
//!
//! ```toml
//! [tools]
//! seed = 7
//!
//! [tools.error_rates]
//! scheduler = 0.1
//! pricing_calculator = 0.05
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure injection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Base seed; each unit derives its own stream from it
    pub seed: u64,
    /// Failure probability per tool id (absent = never fails)
    pub error_rates: BTreeMap<String, f64>,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            error_rates: BTreeMap::new(),
        }
    }
}
