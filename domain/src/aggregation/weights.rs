//! Dimension weights and the per-conversation weighted score

use crate::evaluation::dimension::{Dimension, DimensionScore, clamp_unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Allowed distance of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weight configuration errors. Weights are never renormalized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    #[error("No dimension weights configured")]
    Empty,

    #[error("Weight for '{dimension}' must be a finite non-negative number, got {weight}")]
    Invalid { dimension: Dimension, weight: f64 },

    #[error("Dimension weights sum to {sum}, expected 1.0")]
    DoesNotSumToOne { sum: f64 },

    #[error("Unknown dimension '{0}'")]
    UnknownDimension(Dimension),

    #[error("No score produced for dimension '{0}'")]
    MissingScore(Dimension),
}

/// Weight per dimension, ordered by dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionWeights(BTreeMap<Dimension, f64>);

impl DimensionWeights {
    /// The built-in dimensions with their default weights
    pub fn defaults() -> Self {
        Dimension::BUILTIN
            .iter()
            .filter_map(|d| d.default_weight().map(|w| (d.clone(), w)))
            .collect()
    }

    pub fn get(&self, dimension: &Dimension) -> Option<f64> {
        self.0.get(dimension).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dimension, f64)> {
        self.0.iter().map(|(d, w)| (d, *w))
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.0.keys()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Fail fast on negative, non-finite, or non-unit-sum weights
    pub fn validate(&self) -> Result<(), WeightError> {
        if self.0.is_empty() {
            return Err(WeightError::Empty);
        }
        if let Some((dimension, weight)) = self
            .0
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(WeightError::Invalid {
                dimension: dimension.clone(),
                weight: *weight,
            });
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightError::DoesNotSumToOne { sum });
        }
        Ok(())
    }

    /// `Σ weight_d · score_d`; every weighted dimension must have a score
    pub fn overall(&self, scores: &[DimensionScore]) -> Result<f64, WeightError> {
        self.validate()?;
        let mut total = 0.0;
        for (dimension, weight) in &self.0 {
            let score = scores
                .iter()
                .find(|s| &s.dimension == dimension)
                .ok_or_else(|| WeightError::MissingScore(dimension.clone()))?;
            total += weight * score.score;
        }
        Ok(clamp_unit(total))
    }
}

impl FromIterator<(Dimension, f64)> for DimensionWeights {
    fn from_iter<T: IntoIterator<Item = (Dimension, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<Dimension, f64>> for DimensionWeights {
    fn from(map: BTreeMap<Dimension, f64>) -> Self {
        Self(map)
    }
}
