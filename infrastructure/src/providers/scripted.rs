//! Offline model client for dry runs
//!
//! [`ScriptedModelClient`] first replays any queued responses. After that it
//! follows a playbook built from scenarios. The user messages in the history
//! identify the scenario and the turn index; when they match the opening
//! turns of a known scenario, the client calls that turn's expected tools.
//! Otherwise it answers with a summary of the tool results that followed the
//! latest user message.
//!
//! Two scenarios whose user messages are identical up to the current turn
//! cannot be told apart; the one registered first wins.

use async_trait::async_trait;
use bizeval_application::{GatewayError, ModelClient};
use bizeval_domain::{
    ExpectedToolCall, Message, ModelId, ModelResponse, Role, Scenario, TokenUsage, ToolCall,
    ToolDefinition,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const SIMULATED_LATENCY: Duration = Duration::from_millis(5);

/// One scenario's user messages with the calls expected for each
struct Script {
    turns: Vec<(String, Vec<ExpectedToolCall>)>,
}

impl Script {
    /// Expected calls of the turn the conversation is in, if it follows this script
    fn calls_for(&self, user_messages: &[&str]) -> Option<&[ExpectedToolCall]> {
        let index = user_messages.len().checked_sub(1)?;
        let (_, calls) = self.turns.get(index)?;
        self.turns
            .iter()
            .zip(user_messages)
            .all(|((expected, _), actual)| expected.as_str() == *actual)
            .then_some(calls.as_slice())
    }
}

pub struct ScriptedModelClient {
    id: ModelId,
    queue: Mutex<VecDeque<ModelResponse>>,
    playbook: Vec<Script>,
}

impl ScriptedModelClient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ModelId::new(id),
            queue: Mutex::new(VecDeque::new()),
            playbook: Vec::new(),
        }
    }

    /// Responses returned, in order, before the playbook is consulted
    pub fn with_responses(self, responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.extend(responses);
        }
        self
    }

    /// Learn the expected tool calls of every turn in `scenarios`
    pub fn with_playbook<'a>(mut self, scenarios: impl IntoIterator<Item = &'a Scenario>) -> Self {
        self.playbook.extend(scenarios.into_iter().map(|scenario| Script {
            turns: scenario
                .turns
                .iter()
                .map(|t| (t.user_message.clone(), t.expected_tool_calls.clone()))
                .collect(),
        }));
        self
    }

    fn next_queued(&self) -> Option<ModelResponse> {
        self.queue.lock().ok()?.pop_front()
    }

    fn tool_calls_for(&self, history: &[Message]) -> Vec<ToolCall> {
        let user_messages: Vec<&str> = history
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect();
        let history_len = history.len();
        self.playbook
            .iter()
            .find_map(|script| script.calls_for(&user_messages))
            .map(|expected| {
                expected
                    .iter()
                    .enumerate()
                    .map(|(i, e)| ToolCall {
                        id: format!("call_{}_{}", history_len, i),
                        tool_id: e.tool_id.clone(),
                        arguments: e.parameters.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    fn id(&self) -> &ModelId {
        &self.id
    }

    async fn generate(
        &self,
        history: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError> {
        if let Some(response) = self.next_queued() {
            return Ok(response);
        }
        let last = history
            .last()
            .ok_or_else(|| GatewayError::InvalidResponse("empty history".into()))?;
        let usage = TokenUsage::new(estimate_tokens(history), 40);

        if last.role == Role::User {
            let calls = self.tool_calls_for(history);
            if !calls.is_empty() {
                return Ok(ModelResponse::with_tool_calls("", calls)
                    .with_latency(SIMULATED_LATENCY)
                    .with_usage(usage));
            }
        }
        Ok(ModelResponse::text(summarize(history))
            .with_latency(SIMULATED_LATENCY)
            .with_usage(usage))
    }
}

/// Rough whitespace token count of the whole history
fn estimate_tokens(history: &[Message]) -> u32 {
    history
        .iter()
        .map(|m| m.content.split_whitespace().count())
        .sum::<usize>()
        .try_into()
        .unwrap_or(u32::MAX)
}

/// Reply naming every scalar value the tools returned in the current turn
fn summarize(history: &[Message]) -> String {
    let mut values = Vec::new();
    for message in history.iter().rev().take_while(|m| m.role != Role::User) {
        if message.role == Role::Tool
            && let Ok(value) = serde_json::from_str::<Value>(&message.content)
        {
            collect_scalars(&value, &mut values);
        }
    }
    if values.is_empty() {
        return "Thank you for reaching out. I'm happy to help with that.".to_string();
    }
    format!("Here is what I found: {}.", values.join(", "))
}

fn collect_scalars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_scalars(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_scalars(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}
