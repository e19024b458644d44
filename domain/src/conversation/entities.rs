//! Conversation entities

use crate::conversation::response::{ModelResponse, ResponseMetrics};
use crate::core::error::DomainError;
use crate::tool::entities::ToolCall;
use crate::tool::value_objects::{ToolError, ToolInvocation};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call answered by a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name on a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            name: Some(tool_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

/// How a scripted turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEnd {
    /// The model answered without requesting further tools
    Final,
    /// The per-turn tool-call limit was reached
    ToolBudgetExhausted,
    /// The run failed, timed out or was cancelled during this turn
    Interrupted,
}

/// Bookkeeping for one scripted turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub index: usize,
    pub user_message: String,
    /// One entry per model call made during the turn
    pub responses: Vec<ResponseMetrics>,
    /// Content of the last assistant message of the turn
    pub final_content: String,
    pub end: TurnEnd,
}

impl TurnRecord {
    pub fn is_finished(&self) -> bool {
        self.end != TurnEnd::Interrupted
    }
}

/// Mutable state of one conversation (Entity)
///
/// Owned by exactly one driver for the lifetime of a run. The history is
/// append-only and the API keeps tool results adjacent to the assistant
/// message that requested them: a new model response cannot be recorded
/// while calls from the previous one are still unanswered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    history: Vec<Message>,
    turns: Vec<TurnRecord>,
    invocations: Vec<ToolInvocation>,
    #[serde(skip)]
    pending_calls: Vec<String>,
    #[serde(skip)]
    turn_open: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a state with a leading system message
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.history.push(Message::system(prompt));
        state
    }

    /// Append the user message of turn `index` and open it
    pub fn begin_turn(&mut self, index: usize, user_message: &str) -> Result<(), DomainError> {
        if !self.pending_calls.is_empty() {
            return Err(DomainError::UnansweredToolCalls(self.pending_calls.len()));
        }
        self.history.push(Message::user(user_message));
        self.turns.push(TurnRecord {
            index,
            user_message: user_message.to_string(),
            responses: Vec::new(),
            final_content: String::new(),
            end: TurnEnd::Interrupted,
        });
        self.turn_open = true;
        Ok(())
    }

    /// Append an assistant message and its metadata to the open turn
    pub fn record_response(&mut self, response: &ModelResponse) -> Result<(), DomainError> {
        if !self.pending_calls.is_empty() {
            return Err(DomainError::UnansweredToolCalls(self.pending_calls.len()));
        }
        let turn = self.open_turn_mut()?;
        turn.responses.push(response.metrics());
        turn.final_content = response.content.clone();

        self.pending_calls = response.tool_calls.iter().map(|c| c.id.clone()).collect();
        self.history.push(Message::assistant_with_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
        Ok(())
    }

    /// Append the result of a dispatched call
    pub fn record_tool_result(&mut self, invocation: ToolInvocation) -> Result<(), DomainError> {
        self.take_pending(&invocation.call_id)?;
        self.history.push(Message::tool_result(
            invocation.call_id.clone(),
            invocation.tool_id.clone(),
            invocation.payload().to_string(),
        ));
        self.invocations.push(invocation);
        Ok(())
    }

    /// Answer a call that was never dispatched (e.g. over the per-turn limit)
    ///
    /// The structured error lands in history so the message sequence stays
    /// well formed, but no invocation is recorded.
    pub fn record_skipped_call(
        &mut self,
        call: &ToolCall,
        error: &ToolError,
    ) -> Result<(), DomainError> {
        self.take_pending(&call.id)?;
        self.history.push(Message::tool_result(
            call.id.clone(),
            call.tool_id.clone(),
            error.to_payload().to_string(),
        ));
        Ok(())
    }

    /// Close the open turn
    pub fn finish_turn(&mut self, end: TurnEnd) -> Result<(), DomainError> {
        if !self.pending_calls.is_empty() {
            return Err(DomainError::UnansweredToolCalls(self.pending_calls.len()));
        }
        let turn = self.open_turn_mut()?;
        turn.end = end;
        self.turn_open = false;
        Ok(())
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Full message transcript, for result records
    pub fn transcript(&self) -> Vec<Message> {
        self.history.clone()
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    pub fn turn(&self, index: usize) -> Option<&TurnRecord> {
        self.turns.iter().find(|t| t.index == index)
    }

    /// Index of the turn in progress, if any
    pub fn current_turn(&self) -> Option<usize> {
        if self.turn_open {
            self.turns.last().map(|t| t.index)
        } else {
            None
        }
    }

    pub fn invocations(&self) -> &[ToolInvocation] {
        &self.invocations
    }

    pub fn invocations_for_turn(&self, index: usize) -> impl Iterator<Item = &ToolInvocation> {
        self.invocations.iter().filter(move |i| i.turn_index == index)
    }

    /// Number of model calls across all turns
    pub fn model_calls(&self) -> usize {
        self.turns.iter().map(|t| t.responses.len()).sum()
    }

    fn open_turn_mut(&mut self) -> Result<&mut TurnRecord, DomainError> {
        if !self.turn_open {
            return Err(DomainError::NoActiveTurn);
        }
        self.turns.last_mut().ok_or(DomainError::NoActiveTurn)
    }

    fn take_pending(&mut self, call_id: &str) -> Result<(), DomainError> {
        let position = self
            .pending_calls
            .iter()
            .position(|id| id == call_id)
            .ok_or_else(|| DomainError::UnknownToolCall(call_id.to_string()))?;
        self.pending_calls.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ToolErrorKind;
    use serde_json::{Map, json};
    use std::time::Duration;

    fn invocation(call_id: &str, turn_index: usize) -> ToolInvocation {
        ToolInvocation {
            call_id: call_id.to_string(),
            tool_id: "knowledge_base".to_string(),
            parameters: Map::new(),
            outcome: Ok(json!({"answer": "42"})),
            latency: Duration::from_millis(5),
            turn_index,
        }
    }

    #[test]
    fn test_tool_result_follows_its_call() {
        let mut state = ConversationState::with_system_prompt("You are helpful.");
        state.begin_turn(0, "What is the answer?").unwrap();
        state
            .record_response(&ModelResponse::with_tool_calls(
                "",
                vec![ToolCall::new("c1", "knowledge_base")],
            ))
            .unwrap();
        state.record_tool_result(invocation("c1", 0)).unwrap();
        state
            .record_response(&ModelResponse::text("The answer is 42."))
            .unwrap();
        state.finish_turn(TurnEnd::Final).unwrap();

        let roles: Vec<Role> = state.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(state.history()[3].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(state.turns()[0].final_content, "The answer is 42.");
        assert_eq!(state.turns()[0].responses.len(), 2);
        assert_eq!(state.invocations().len(), 1);
        assert_eq!(state.current_turn(), None);
    }

    #[test]
    fn test_response_rejected_while_calls_unanswered() {
        let mut state = ConversationState::new();
        state.begin_turn(0, "hi").unwrap();
        state
            .record_response(&ModelResponse::with_tool_calls(
                "",
                vec![ToolCall::new("c1", "knowledge_base")],
            ))
            .unwrap();
        let err = state.record_response(&ModelResponse::text("done")).unwrap_err();
        assert_eq!(err, DomainError::UnansweredToolCalls(1));
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_unknown_call_id_rejected() {
        let mut state = ConversationState::new();
        state.begin_turn(0, "hi").unwrap();
        state.record_response(&ModelResponse::text("hello")).unwrap();
        let err = state.record_tool_result(invocation("nope", 0)).unwrap_err();
        assert_eq!(err, DomainError::UnknownToolCall("nope".into()));
    }

    #[test]
    fn test_skipped_call_is_answered_but_not_recorded() {
        let mut state = ConversationState::new();
        state.begin_turn(0, "hi").unwrap();
        let call = ToolCall::new("c9", "scheduler");
        state
            .record_response(&ModelResponse::with_tool_calls("", vec![call.clone()]))
            .unwrap();
        let error = ToolError::of_kind(ToolErrorKind::ToolCallBudgetExceeded, "scheduler");
        state.record_skipped_call(&call, &error).unwrap();
        state.finish_turn(TurnEnd::ToolBudgetExhausted).unwrap();

        assert!(state.invocations().is_empty());
        assert!(state.history()[2].content.contains("ToolCallBudgetExceeded"));
    }

    #[test]
    fn test_open_turn_is_interrupted_until_finished() {
        let mut state = ConversationState::new();
        state.begin_turn(0, "hi").unwrap();
        assert_eq!(state.current_turn(), Some(0));
        assert_eq!(state.turns()[0].end, TurnEnd::Interrupted);
        assert!(!state.turns()[0].is_finished());
        assert_eq!(state.finish_turn(TurnEnd::Final), Ok(()));
        assert_eq!(state.finish_turn(TurnEnd::Final), Err(DomainError::NoActiveTurn));
    }
}
