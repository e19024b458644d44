//! Unit-of-work entities

use crate::conversation::{ConversationState, Message, TurnRecord};
use crate::core::error::DomainError;
use crate::core::model::ModelId;
use crate::evaluation::dimension::{Dimension, DimensionScore};
use crate::tool::value_objects::ToolInvocation;
use serde::{Deserialize, Serialize};

/// Identity of one (model, scenario, run) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub model_id: ModelId,
    pub scenario_id: String,
    pub run_index: usize,
}

impl UnitId {
    pub fn new(model_id: ModelId, scenario_id: impl Into<String>, run_index: usize) -> Self {
        Self {
            model_id,
            scenario_id: scenario_id.into(),
            run_index,
        }
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.model_id, self.scenario_id, self.run_index)
    }
}

/// Lifecycle of a unit: `Pending → Running → {Completed | Failed}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl UnitStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UnitStatus::Pending => "PENDING",
            UnitStatus::Running => "RUNNING",
            UnitStatus::Completed => "COMPLETED",
            UnitStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitStatus::Completed | UnitStatus::Failed)
    }

    /// Move to `next`, rejecting anything but the forward edges
    pub fn transition(self, next: UnitStatus) -> Result<UnitStatus, DomainError> {
        match (self, next) {
            (UnitStatus::Pending, UnitStatus::Running)
            | (UnitStatus::Running, UnitStatus::Completed)
            | (UnitStatus::Running, UnitStatus::Failed) => Ok(next),
            _ => Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a unit ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFailureKind {
    /// The model capability returned an error
    ModelError,
    /// The unit exceeded its wall-clock budget
    Timeout,
    /// Scoring could not produce an overall score
    Evaluation,
    /// The unit's task aborted unexpectedly
    Internal,
}

impl UnitFailureKind {
    pub fn as_str(&self) -> &str {
        match self {
            UnitFailureKind::ModelError => "model_error",
            UnitFailureKind::Timeout => "timeout",
            UnitFailureKind::Evaluation => "evaluation",
            UnitFailureKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for UnitFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic record of a failed unit; the partial conversation is kept
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub unit: UnitId,
    pub kind: UnitFailureKind,
    /// Turn in progress when the failure happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<usize>,
    pub message: String,
    pub partial_state: ConversationState,
}

impl UnitFailure {
    pub fn new(
        unit: UnitId,
        kind: UnitFailureKind,
        message: impl Into<String>,
        partial_state: ConversationState,
    ) -> Self {
        let turn_index = partial_state.current_turn();
        Self {
            unit,
            kind,
            turn_index,
            message: message.into(),
            partial_state,
        }
    }
}

/// Result of one completed unit, as handed to the result sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub model_id: ModelId,
    pub scenario_id: String,
    pub run_index: usize,
    pub overall_score: f64,
    pub dimension_scores: Vec<DimensionScore>,
    pub tool_invocations: Vec<ToolInvocation>,
    pub transcript: Vec<Message>,
    pub turns: Vec<TurnRecord>,
}

impl RunRecord {
    pub fn new(
        unit: UnitId,
        state: ConversationState,
        dimension_scores: Vec<DimensionScore>,
        overall_score: f64,
    ) -> Self {
        Self {
            model_id: unit.model_id,
            scenario_id: unit.scenario_id,
            run_index: unit.run_index,
            overall_score,
            dimension_scores,
            tool_invocations: state.invocations().to_vec(),
            transcript: state.transcript(),
            turns: state.turns().to_vec(),
        }
    }

    pub fn unit_id(&self) -> UnitId {
        UnitId::new(self.model_id.clone(), self.scenario_id.clone(), self.run_index)
    }

    pub fn dimension_score(&self, dimension: &Dimension) -> Option<f64> {
        self.dimension_scores
            .iter()
            .find(|s| &s.dimension == dimension)
            .map(|s| s.score)
    }
}
