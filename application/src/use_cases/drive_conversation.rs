//! Drive conversation use case
//!
//! Plays one scripted scenario against one model for one run.

use crate::ports::model_client::{GatewayError, ModelClient};
use crate::use_cases::dispatch_tool::ToolDispatcher;
use bizeval_domain::{ConversationState, DomainError, Scenario, ToolError, ToolErrorKind, TurnEnd};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that end a conversation early.
///
/// Tool failures never show up here: they are fed back to the model as
/// structured results.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Model failed in turn {turn_index}: {source}")]
    Model {
        turn_index: usize,
        source: GatewayError,
    },

    #[error("Conversation state error: {0}")]
    State(#[from] DomainError),
}

/// Executes the turn loop of a scenario.
///
/// Within a turn the driver keeps requesting responses while the model
/// asks for tools, dispatching calls one at a time, until a response
/// carries no tool calls or `max_tool_calls_per_turn` calls have been
/// dispatched. Calls beyond the limit are answered with a
/// `ToolCallBudgetExceeded` error and end the turn.
#[derive(Debug, Clone, Copy)]
pub struct ConversationDriver {
    max_tool_calls_per_turn: usize,
}

impl Default for ConversationDriver {
    fn default() -> Self {
        Self {
            max_tool_calls_per_turn: 8,
        }
    }
}

impl ConversationDriver {
    /// `max_tool_calls_per_turn` is clamped to at least 1
    pub fn new(max_tool_calls_per_turn: usize) -> Self {
        Self {
            max_tool_calls_per_turn: max_tool_calls_per_turn.max(1),
        }
    }

    pub fn max_tool_calls_per_turn(&self) -> usize {
        self.max_tool_calls_per_turn
    }

    /// Run every turn of `scenario`, appending to `state`.
    ///
    /// `state` is owned by the caller so whatever was recorded survives an
    /// error, a timeout or the future being dropped.
    pub async fn drive(
        &self,
        scenario: &Scenario,
        model: &dyn ModelClient,
        dispatcher: &mut ToolDispatcher,
        state: &mut ConversationState,
    ) -> Result<(), DriveError> {
        for (index, turn) in scenario.turns.iter().enumerate() {
            state.begin_turn(index, &turn.user_message)?;
            let end = self.drive_turn(index, model, dispatcher, state).await?;
            state.finish_turn(end)?;
            debug!("{}: turn {} ended ({:?})", scenario.id, index, end);
        }
        Ok(())
    }

    async fn drive_turn(
        &self,
        turn_index: usize,
        model: &dyn ModelClient,
        dispatcher: &mut ToolDispatcher,
        state: &mut ConversationState,
    ) -> Result<TurnEnd, DriveError> {
        let mut dispatched = 0;
        loop {
            let response = model
                .generate(state.history(), dispatcher.tools())
                .await
                .map_err(|source| DriveError::Model { turn_index, source })?;
            state.record_response(&response)?;

            if !response.has_tool_calls() {
                return Ok(TurnEnd::Final);
            }

            let mut exhausted = false;
            for call in &response.tool_calls {
                if dispatched >= self.max_tool_calls_per_turn {
                    let error = ToolError::of_kind(ToolErrorKind::ToolCallBudgetExceeded, &call.tool_id);
                    state.record_skipped_call(call, &error)?;
                    exhausted = true;
                    continue;
                }
                let invocation = dispatcher.dispatch(call, turn_index).await;
                dispatched += 1;
                state.record_tool_result(invocation)?;
            }

            if exhausted {
                warn!(
                    "Turn {} hit the limit of {} tool calls",
                    turn_index, self.max_tool_calls_per_turn
                );
                return Ok(TurnEnd::ToolBudgetExhausted);
            }
        }
    }
}
