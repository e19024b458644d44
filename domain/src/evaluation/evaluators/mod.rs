//! Reference evaluators for the five built-in dimensions.
//!
//! Each evaluator decomposes its dimension into fixed-weight criteria.
//! Turn-level evaluators score every scripted turn and average the
//! criteria across turns; business value looks at the conversation as a
//! whole.

mod business_value;
mod communication_style;
mod performance;
mod response_quality;
mod tool_usage;

pub use business_value::BusinessValueEvaluator;
pub use communication_style::CommunicationStyleEvaluator;
pub use performance::{PerformanceEvaluator, PerformanceThresholds, saturating_linear};
pub use response_quality::ResponseQualityEvaluator;
pub use tool_usage::ToolUsageEvaluator;

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built conversations shared by evaluator tests

    use crate::conversation::{ConversationState, ModelResponse, TokenUsage, TurnEnd};
    use crate::scenario::{ExpectedToolCall, GroundTruth, Scenario, Turn};
    use crate::tool::entities::ToolCall;
    use crate::tool::value_objects::{ToolError, ToolInvocation, ToolOutcome};
    use serde_json::json;
    use std::time::Duration;

    /// Two turns: knowledge_base lookup, then a scheduler booking
    pub fn scheduling_scenario() -> Scenario {
        Scenario::new("appointment_scheduling", "Appointment scheduling")
            .with_tools(["knowledge_base", "scheduler", "product_catalog"])
            .with_turn(
                Turn::new("What is the implementation timeline for the analytics platform?")
                    .expect_tool(
                        ExpectedToolCall::new("knowledge_base")
                            .with_param("query", "implementation timeline"),
                    )
                    .expect_fact("implementation timeline: 6-8 weeks")
                    .require_element("timeline"),
            )
            .with_turn(
                Turn::new("Please schedule a demo meeting for next Tuesday.")
                    .expect_tool(
                        ExpectedToolCall::new("scheduler").with_param("meeting_type", "demo"),
                    )
                    .expect_fact("demo: Tuesday")
                    .require_element("demo meeting"),
            )
            .with_ground_truth(GroundTruth {
                business_objective: Some("Book a product demo".into()),
                action_items: vec!["schedule demo".into()],
                domain_knowledge: vec!["implementation timeline".into()],
                relevant_tools: vec!["knowledge_base".into(), "scheduler".into()],
                expected_tone: Some("professional".into()),
                communication_guidelines: vec![],
            })
    }

    pub struct ScriptedTurn {
        pub calls: Vec<(ToolCall, ToolOutcome)>,
        pub final_content: String,
        pub latency: Duration,
        pub completion_tokens: u32,
    }

    impl ScriptedTurn {
        pub fn answer(final_content: &str) -> Self {
            Self {
                calls: Vec::new(),
                final_content: final_content.to_string(),
                latency: Duration::from_millis(800),
                completion_tokens: 120,
            }
        }

        pub fn with_call(mut self, call: ToolCall, outcome: ToolOutcome) -> Self {
            self.calls.push((call, outcome));
            self
        }
    }

    /// Replay turns into a state the way the driver records them
    pub fn converse(scenario: &Scenario, turns: Vec<ScriptedTurn>) -> ConversationState {
        let mut state = ConversationState::new();
        for (index, (scripted, turn)) in turns.into_iter().zip(&scenario.turns).enumerate() {
            state.begin_turn(index, &turn.user_message).unwrap();
            let usage = TokenUsage::new(300, scripted.completion_tokens);
            if !scripted.calls.is_empty() {
                let calls: Vec<ToolCall> = scripted.calls.iter().map(|(c, _)| c.clone()).collect();
                state
                    .record_response(
                        &ModelResponse::with_tool_calls("", calls)
                            .with_latency(scripted.latency / 2)
                            .with_usage(TokenUsage::new(300, 0)),
                    )
                    .unwrap();
                for (call, outcome) in scripted.calls {
                    state
                        .record_tool_result(ToolInvocation {
                            call_id: call.id.clone(),
                            tool_id: call.tool_id.clone(),
                            parameters: call.arguments.clone(),
                            outcome,
                            latency: Duration::from_millis(3),
                            turn_index: index,
                        })
                        .unwrap();
                }
                state
                    .record_response(
                        &ModelResponse::text(&scripted.final_content)
                            .with_latency(scripted.latency / 2)
                            .with_usage(usage),
                    )
                    .unwrap();
            } else {
                state
                    .record_response(
                        &ModelResponse::text(&scripted.final_content)
                            .with_latency(scripted.latency)
                            .with_usage(usage),
                    )
                    .unwrap();
            }
            state.finish_turn(TurnEnd::Final).unwrap();
        }
        state
    }

    pub fn kb_result() -> serde_json::Value {
        json!({"topic": "implementation timeline", "answer": "Typical rollout takes 6-8 weeks"})
    }

    pub fn scheduler_result() -> serde_json::Value {
        json!({"status": "booked", "meeting_type": "demo", "slot": "Tuesday 10:00"})
    }

    /// Model that calls exactly the expected tools and echoes their results
    pub fn ideal_conversation(scenario: &Scenario) -> ConversationState {
        converse(
            scenario,
            vec![
                ScriptedTurn::answer(&format!(
                    "Thank you for asking about the analytics platform. Our implementation \
                     timeline is typically 6-8 weeks, per our guide: {}.",
                    kb_result()
                ))
                .with_call(
                    ToolCall::new("c1", "knowledge_base")
                        .with_arg("query", "implementation timeline"),
                    Ok(kb_result()),
                ),
                ScriptedTurn::answer(&format!(
                    "Your product demo meeting is booked for next Tuesday at 10:00. \
                     Our team will provide the meeting details: {}.",
                    scheduler_result()
                ))
                .with_call(
                    ToolCall::new("c2", "scheduler").with_arg("meeting_type", "demo"),
                    Ok(scheduler_result()),
                ),
            ],
        )
    }

    pub fn error_outcome(error: ToolError) -> ToolOutcome {
        Err(error)
    }
}
