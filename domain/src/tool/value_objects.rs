//! Tool domain value objects: immutable outcome and error types
//!
//! A tool error is a *scenario event*: it is serialized into the
//! conversation exactly like a successful result so the model under
//! evaluation can react to it. [`ToolInvocation`] is the record the
//! evaluators read afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Kind of a structured tool error.
///
/// | Kind | Source |
/// |------|--------|
/// | `ToolNotFound` | dispatcher, unknown tool id |
/// | `InvalidParameters` | dispatcher, required parameter missing |
/// | `ToolCallBudgetExceeded` | driver, per-turn call limit reached |
/// | `ToolTimeout` .. `InvalidData` | failure injector |
/// | `ExecutionFailed` | backend |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolErrorKind {
    ToolNotFound,
    ToolTimeout,
    ToolPermissionDenied,
    ServiceUnavailable,
    RateLimitExceeded,
    InvalidData,
    InvalidParameters,
    ExecutionFailed,
    ToolCallBudgetExceeded,
}

impl ToolErrorKind {
    /// Kinds the failure injector draws from, in draw order
    pub const INJECTABLE: [ToolErrorKind; 5] = [
        ToolErrorKind::ToolTimeout,
        ToolErrorKind::ToolPermissionDenied,
        ToolErrorKind::ServiceUnavailable,
        ToolErrorKind::RateLimitExceeded,
        ToolErrorKind::InvalidData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::ToolNotFound => "ToolNotFound",
            ToolErrorKind::ToolTimeout => "ToolTimeout",
            ToolErrorKind::ToolPermissionDenied => "ToolPermissionDenied",
            ToolErrorKind::ServiceUnavailable => "ServiceUnavailable",
            ToolErrorKind::RateLimitExceeded => "RateLimitExceeded",
            ToolErrorKind::InvalidData => "InvalidData",
            ToolErrorKind::InvalidParameters => "InvalidParameters",
            ToolErrorKind::ExecutionFailed => "ExecutionFailed",
            ToolErrorKind::ToolCallBudgetExceeded => "ToolCallBudgetExceeded",
        }
    }

    /// Default message used when an error of this kind is injected
    pub fn default_message(&self, tool_id: &str) -> String {
        match self {
            ToolErrorKind::ToolNotFound => format!("Tool '{}' is not available", tool_id),
            ToolErrorKind::ToolTimeout => format!("Tool '{}' timed out", tool_id),
            ToolErrorKind::ToolPermissionDenied => {
                format!("Permission denied for tool '{}'", tool_id)
            }
            ToolErrorKind::ServiceUnavailable => {
                format!("Service behind '{}' is temporarily unavailable", tool_id)
            }
            ToolErrorKind::RateLimitExceeded => format!("Rate limit exceeded for '{}'", tool_id),
            ToolErrorKind::InvalidData => format!("Tool '{}' returned invalid data", tool_id),
            ToolErrorKind::InvalidParameters => {
                format!("Invalid parameters for tool '{}'", tool_id)
            }
            ToolErrorKind::ExecutionFailed => format!("Tool '{}' failed to execute", tool_id),
            ToolErrorKind::ToolCallBudgetExceeded => {
                format!("Tool call limit reached for this turn; '{}' was not run", tool_id)
            }
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error returned in place of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Hint for rate-limit style errors
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_secs_opt"
    )]
    pub retry_after: Option<Duration>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Error of `kind` with its default message for `tool_id`
    pub fn of_kind(kind: ToolErrorKind, tool_id: &str) -> Self {
        let error = Self::new(kind, kind.default_message(tool_id));
        if kind == ToolErrorKind::RateLimitExceeded {
            error.with_retry_after(Duration::from_secs(30))
        } else {
            error
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn not_found(tool_id: &str) -> Self {
        Self::of_kind(ToolErrorKind::ToolNotFound, tool_id)
    }

    pub fn invalid_parameters(tool_id: &str, missing: &[String]) -> Self {
        Self::new(
            ToolErrorKind::InvalidParameters,
            format!(
                "Missing required parameters for '{}': {}",
                tool_id,
                missing.join(", ")
            ),
        )
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed, message)
    }

    /// The structured object appended to the conversation history
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "status": "error",
            "error": self.kind.as_str(),
            "message": self.message,
        });
        if let (Some(retry), Some(obj)) = (self.retry_after, payload.as_object_mut()) {
            obj.insert("retry_after_secs".to_string(), json!(retry.as_secs()));
        }
        payload
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Outcome of one tool execution
pub type ToolOutcome = Result<Value, ToolError>;

/// Immutable record of one dispatched tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Id of the model's tool call this answers
    pub call_id: String,
    pub tool_id: String,
    pub parameters: Map<String, Value>,
    #[serde(with = "outcome_serde")]
    pub outcome: ToolOutcome,
    #[serde(with = "duration_millis")]
    pub latency: Duration,
    /// Scripted turn during which the call was made
    pub turn_index: usize,
}

impl ToolInvocation {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.outcome.as_ref().err().map(|e| e.kind)
    }

    /// Content of the tool message appended to history
    pub fn payload(&self) -> Value {
        match &self.outcome {
            Ok(value) => value.clone(),
            Err(error) => error.to_payload(),
        }
    }
}

mod outcome_serde {
    use super::{ToolError, ToolOutcome};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Repr<R, E> {
        Result(R),
        Error(E),
    }

    pub fn serialize<S: Serializer>(outcome: &ToolOutcome, s: S) -> Result<S::Ok, S::Error> {
        match outcome {
            Ok(v) => Repr::<&Value, &ToolError>::Result(v).serialize(s),
            Err(e) => Repr::<&Value, &ToolError>::Error(e).serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ToolOutcome, D::Error> {
        Ok(match Repr::<Value, ToolError>::deserialize(d)? {
            Repr::Result(v) => Ok(v),
            Repr::Error(e) => Err(e),
        })
    }
}

pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_payload() {
        let payload = ToolError::not_found("crm_lookup").to_payload();
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error"], "ToolNotFound");
        assert_eq!(payload["message"], "Tool 'crm_lookup' is not available");
        assert!(payload.get("retry_after_secs").is_none());
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let error = ToolError::of_kind(ToolErrorKind::RateLimitExceeded, "scheduler");
        assert_eq!(error.retry_after, Some(Duration::from_secs(30)));
        assert_eq!(error.to_payload()["retry_after_secs"], 30);
    }

    #[test]
    fn test_invocation_serializes_outcome_tag() {
        let invocation = ToolInvocation {
            call_id: "c1".into(),
            tool_id: "scheduler".into(),
            parameters: Map::new(),
            outcome: Err(ToolError::of_kind(ToolErrorKind::ToolTimeout, "scheduler")),
            latency: Duration::from_millis(12),
            turn_index: 1,
        };
        let json = serde_json::to_value(&invocation).unwrap();
        assert_eq!(json["outcome"]["error"]["kind"], "ToolTimeout");
        assert_eq!(json["latency"], 12);

        let back: ToolInvocation = serde_json::from_value(json).unwrap();
        assert_eq!(back, invocation);
        assert_eq!(back.error_kind(), Some(ToolErrorKind::ToolTimeout));
    }
}
