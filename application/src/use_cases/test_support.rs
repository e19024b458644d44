//! Test doubles shared by the use case tests.

use crate::ports::model_client::{GatewayError, ModelClient};
use crate::ports::tool_backend::ToolBackend;
use async_trait::async_trait;
use bizeval_domain::{
    Message, ModelId, ModelResponse, Role, Scenario, TokenUsage, ToolCall, ToolDefinition,
    ToolOutcome, ToolParameter, ToolSpec,
};
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Backend offering `knowledge_base` and `scheduler` that echoes parameters
pub struct EchoTools {
    spec: ToolSpec,
}

impl EchoTools {
    pub fn new() -> Self {
        let spec = ToolSpec::new()
            .register(
                ToolDefinition::new("knowledge_base", "Search company knowledge")
                    .with_parameter(ToolParameter::new("query", "Search query", true)),
            )
            .register(
                ToolDefinition::new("scheduler", "Book meetings")
                    .with_parameter(ToolParameter::new("meeting_type", "Kind of meeting", true))
                    .with_parameter(ToolParameter::new("date", "Preferred date", false)),
            );
        Self { spec }
    }
}

#[async_trait]
impl ToolBackend for EchoTools {
    fn definitions(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, tool_id: &str, parameters: &Map<String, Value>) -> ToolOutcome {
        let mut result = parameters.clone();
        result.insert("tool".into(), json!(tool_id));
        match tool_id {
            "knowledge_base" => {
                result.insert("answer".into(), json!("implementation timeline is 6-8 weeks"))
            }
            _ => result.insert("slot".into(), json!("Tuesday 10:00")),
        };
        Ok(Value::Object(result))
    }
}

/// Replays a fixed queue of responses, then answers "Done."
pub struct ScriptedModel {
    id: ModelId,
    script: Mutex<VecDeque<Result<ModelResponse, GatewayError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(id: &str, script: Vec<Result<ModelResponse, GatewayError>>) -> Self {
        Self {
            id: ModelId::new(id),
            script: Mutex::new(script.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn id(&self) -> &ModelId {
        &self.id
    }

    async fn generate(
        &self,
        _history: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text("Done.")))
    }
}

/// Calls exactly the expected tools of each turn, then echoes the results.
///
/// Works purely off the history, so one instance can serve many
/// concurrent units.
pub struct ExpectedToolsModel {
    id: ModelId,
    scenario: Scenario,
}

impl ExpectedToolsModel {
    pub fn new(id: &str, scenario: Scenario) -> Self {
        Self {
            id: ModelId::new(id),
            scenario,
        }
    }
}

#[async_trait]
impl ModelClient for ExpectedToolsModel {
    fn id(&self) -> &ModelId {
        &self.id
    }

    async fn generate(
        &self,
        history: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError> {
        let usage = TokenUsage::new(120, 80);
        let latency = Duration::from_millis(400);
        let Some(last) = history.last() else {
            return Err(GatewayError::InvalidResponse("empty history".into()));
        };
        if last.role == Role::User {
            let turn = self
                .scenario
                .turns
                .iter()
                .find(|t| t.user_message == last.content);
            let calls: Vec<ToolCall> = turn
                .map(|t| {
                    t.expected_tool_calls
                        .iter()
                        .enumerate()
                        .map(|(i, expected)| {
                            let mut call =
                                ToolCall::new(format!("{}-{}", history.len(), i), &expected.tool_id);
                            call.arguments = expected.parameters.clone();
                            call
                        })
                        .collect()
                })
                .unwrap_or_default();
            if !calls.is_empty() {
                return Ok(ModelResponse::with_tool_calls("", calls)
                    .with_latency(latency)
                    .with_usage(usage));
            }
        }
        // One sentence naming the user's key terms and every string value
        // the tools returned, so lexical scoring sees both.
        let question = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let terms: Vec<String> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .map(str::to_lowercase)
            .collect();
        let values: Vec<String> = history
            .iter()
            .rev()
            .take_while(|m| m.role == Role::Tool)
            .filter_map(|m| serde_json::from_str::<Value>(&m.content).ok())
            .flat_map(|v| match v {
                Value::Object(map) => map
                    .into_values()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect();
        let content = format!("Regarding {}: {}", terms.join(" "), values.join(", "));
        Ok(ModelResponse::text(content)
            .with_latency(latency)
            .with_usage(usage))
    }
}
