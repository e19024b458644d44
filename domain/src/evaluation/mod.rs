//! Evaluation subdomain: dimensions, the evaluator seam, the reference
//! evaluators and the registration table the pipeline consumes.

pub mod context;
pub mod dimension;
pub mod evaluator;
pub mod evaluators;
pub mod text;

pub use context::{EvaluationContext, TurnView};
pub use dimension::{CriterionScore, Dimension, DimensionScore};
pub use evaluator::{Evaluator, EvaluatorRegistry};
pub use evaluators::{
    BusinessValueEvaluator, CommunicationStyleEvaluator, PerformanceEvaluator,
    PerformanceThresholds, ResponseQualityEvaluator, ToolUsageEvaluator,
};
