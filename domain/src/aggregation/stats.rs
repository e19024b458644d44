//! Multi-run statistics with an explicit no-data state

use serde::{Deserialize, Serialize};

/// Descriptive statistics over a non-empty set of scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    /// `None` for an empty slice
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Identical runs must report exactly zero spread
        if min == max {
            return Some(Self {
                count,
                mean: min,
                std_dev: 0.0,
                min,
                max,
            });
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Aggregate of a group of runs; `NoData` when every run failed or none ran
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreSummary {
    NoData,
    Stats(ScoreStats),
}

impl ScoreSummary {
    pub fn from_values(values: &[f64]) -> Self {
        ScoreStats::from_values(values).map_or(ScoreSummary::NoData, ScoreSummary::Stats)
    }

    pub fn stats(&self) -> Option<&ScoreStats> {
        match self {
            ScoreSummary::Stats(stats) => Some(stats),
            ScoreSummary::NoData => None,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        self.stats().map(|s| s.mean)
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ScoreSummary::NoData)
    }
}
