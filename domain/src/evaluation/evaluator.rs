//! Evaluator trait and the explicit registration table

use crate::aggregation::weights::{DimensionWeights, WeightError};
use crate::evaluation::context::EvaluationContext;
use crate::evaluation::dimension::{Dimension, DimensionScore};
use crate::evaluation::evaluators::{
    BusinessValueEvaluator, CommunicationStyleEvaluator, PerformanceEvaluator,
    PerformanceThresholds, ResponseQualityEvaluator, ToolUsageEvaluator,
};
use std::collections::BTreeMap;

/// Scores one dimension of a completed conversation.
///
/// Implementations must be pure: the same context always yields the same
/// score, so logged conversations can be re-scored reproducibly.
pub trait Evaluator: Send + Sync {
    fn dimension(&self) -> Dimension;

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore;
}

struct Registered {
    evaluator: Box<dyn Evaluator>,
    weight: f64,
}

/// Closed set of evaluators and their weights for one pipeline invocation.
///
/// Built once at startup and handed to the pipeline; there is no global
/// registration.
#[derive(Default)]
pub struct EvaluatorRegistry {
    entries: Vec<Registered>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five reference evaluators with their default weights
    pub fn standard() -> Self {
        Self::standard_with_thresholds(PerformanceThresholds::default())
    }

    pub fn standard_with_thresholds(thresholds: PerformanceThresholds) -> Self {
        Self::new()
            .register(ResponseQualityEvaluator, 0.25)
            .register(BusinessValueEvaluator, 0.25)
            .register(CommunicationStyleEvaluator, 0.20)
            .register(ToolUsageEvaluator, 0.20)
            .register(PerformanceEvaluator::new(thresholds), 0.10)
    }

    /// Add an evaluator, replacing any existing one for the same dimension
    pub fn register(mut self, evaluator: impl Evaluator + 'static, weight: f64) -> Self {
        let dimension = evaluator.dimension();
        self.entries.retain(|e| e.evaluator.dimension() != dimension);
        self.entries.push(Registered {
            evaluator: Box::new(evaluator),
            weight,
        });
        self
    }

    /// Override weights by dimension; every key must name a registered
    /// evaluator. Dimensions not mentioned keep their weight.
    pub fn with_weights(mut self, weights: &BTreeMap<Dimension, f64>) -> Result<Self, WeightError> {
        for (dimension, weight) in weights {
            let entry = self
                .entries
                .iter_mut()
                .find(|e| &e.evaluator.dimension() == dimension)
                .ok_or_else(|| WeightError::UnknownDimension(dimension.clone()))?;
            entry.weight = *weight;
        }
        Ok(self)
    }

    pub fn weights(&self) -> DimensionWeights {
        self.entries
            .iter()
            .map(|e| (e.evaluator.dimension(), e.weight))
            .collect()
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        self.entries.iter().map(|e| e.evaluator.dimension()).collect()
    }

    /// Run every registered evaluator, in registration order
    pub fn evaluate_all(&self, ctx: &EvaluationContext<'_>) -> Vec<DimensionScore> {
        self.entries
            .iter()
            .map(|e| e.evaluator.evaluate(ctx))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.evaluator.dimension(), e.weight)))
            .finish()
    }
}
