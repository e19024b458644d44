//! Success-rate policies
//!
//! How a model's "success rate" is derived from its run scores is a product
//! decision, so it is configurable rather than fixed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SuccessRatePolicy {
    /// Fraction of runs whose overall score is strictly above `threshold`
    Threshold { threshold: f64 },
    /// `clamp(base_rate + (mean - pivot) * slope, floor, ceiling)`
    AdjustedBaseRate {
        base_rate: f64,
        pivot: f64,
        slope: f64,
        floor: f64,
        ceiling: f64,
    },
}

impl Default for SuccessRatePolicy {
    fn default() -> Self {
        SuccessRatePolicy::Threshold { threshold: 0.7 }
    }
}

impl SuccessRatePolicy {
    /// The linear base-rate adjustment with its customary constants
    pub fn adjusted_base_rate(base_rate: f64) -> Self {
        SuccessRatePolicy::AdjustedBaseRate {
            base_rate,
            pivot: 0.75,
            slope: 0.3,
            floor: 0.1,
            ceiling: 0.95,
        }
    }

    /// Success rate over completed runs; `None` when there are none
    pub fn rate(&self, overall_scores: &[f64]) -> Option<f64> {
        if overall_scores.is_empty() {
            return None;
        }
        match *self {
            SuccessRatePolicy::Threshold { threshold } => {
                let passed = overall_scores.iter().filter(|s| **s > threshold).count();
                Some(passed as f64 / overall_scores.len() as f64)
            }
            SuccessRatePolicy::AdjustedBaseRate {
                base_rate,
                pivot,
                slope,
                floor,
                ceiling,
            } => {
                let mean = overall_scores.iter().sum::<f64>() / overall_scores.len() as f64;
                Some((base_rate + (mean - pivot) * slope).clamp(floor, ceiling))
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(format!("{} must be within [0, 1], got {}", name, v))
            }
        };
        match *self {
            SuccessRatePolicy::Threshold { threshold } => unit("threshold", threshold),
            SuccessRatePolicy::AdjustedBaseRate {
                base_rate,
                pivot,
                slope,
                floor,
                ceiling,
            } => {
                unit("base_rate", base_rate)?;
                unit("pivot", pivot)?;
                unit("floor", floor)?;
                unit("ceiling", ceiling)?;
                if !slope.is_finite() {
                    return Err("slope must be finite".to_string());
                }
                if floor > ceiling {
                    return Err(format!("floor {} exceeds ceiling {}", floor, ceiling));
                }
                Ok(())
            }
        }
    }
}
