//! Domain layer for bizeval
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Scenario
//!
//! A scripted multi-turn business conversation with per-turn expectations
//! (tools, facts, required elements) and scenario-level ground truth.
//!
//! ## Unit
//!
//! One (model, scenario, run) triple. Each unit drives a conversation,
//! scores it across the evaluation dimensions and either completes with a
//! [`RunRecord`] or fails with a [`UnitFailure`].
//!
//! ## Dimensions
//!
//! - **Response quality**: accuracy, completeness and relevance per turn
//! - **Tool usage**: selection, parameters, efficiency and interpretation
//! - **Business value**: objective, actionability and domain acumen
//! - **Communication style**: professionalism, clarity, tone and adaptability
//! - **Performance**: latency and token consumption against thresholds

pub mod aggregation;
pub mod conversation;
pub mod core;
pub mod evaluation;
pub mod scenario;
pub mod tool;
pub mod unit;

// Re-export commonly used types
pub use aggregation::{
    AggregateReport, DimensionWeights, FailureSummary, ModelSummary, PairSummary, ScoreStats,
    ScoreSummary, SuccessRatePolicy, UnitTally, WEIGHT_TOLERANCE, WeightError,
};
pub use conversation::{
    ConversationState, Message, ModelResponse, ResponseMetrics, Role, TokenUsage, TurnEnd,
    TurnRecord,
};
pub use core::{error::DomainError, model::ModelId};
pub use evaluation::{
    BusinessValueEvaluator, CommunicationStyleEvaluator, CriterionScore, Dimension,
    DimensionScore, EvaluationContext, Evaluator, EvaluatorRegistry, PerformanceEvaluator,
    PerformanceThresholds, ResponseQualityEvaluator, ToolUsageEvaluator, TurnView,
};
pub use scenario::{Complexity, CustomerContext, ExpectedToolCall, GroundTruth, Scenario, Turn};
pub use tool::{
    entities::{ToolCall, ToolDefinition, ToolParameter, ToolSpec},
    value_objects::{ToolError, ToolErrorKind, ToolInvocation, ToolOutcome},
};
pub use unit::{RunRecord, UnitFailure, UnitFailureKind, UnitId, UnitStatus};
