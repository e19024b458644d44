use crate::evaluation::context::{EvaluationContext, TurnView, average_criteria};
use crate::evaluation::dimension::{CriterionScore, Dimension, DimensionScore};
use crate::evaluation::evaluator::Evaluator;
use crate::evaluation::text;
use crate::scenario::ExpectedToolCall;
use crate::tool::value_objects::{ToolErrorKind, ToolInvocation};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const SELECTION: f64 = 0.3;
const PARAMETERS: f64 = 0.3;
const EFFICIENCY: f64 = 0.2;
const INTERPRETATION: f64 = 0.2;

/// Selection penalty per unnecessary call, capped at one full point of three
const UNNECESSARY_PENALTY: f64 = 0.33;
/// Calls to one tool within a turn beyond this count are redundant
const REDUNDANCY_ALLOWANCE: usize = 2;
const REDUNDANCY_PENALTY: f64 = 0.125;
/// Redundant calls cost at most half of the efficiency criterion
const MAX_REDUNDANCY_PENALTY: f64 = 0.5;

/// Phrases showing the final answer acknowledged a failed tool call
const ERROR_ACKNOWLEDGEMENTS: &[&str] = &[
    "unable",
    "unavailable",
    "issue",
    "problem",
    "error",
    "try again",
    "sorry",
    "apolog",
    "couldn't",
    "could not",
    "not able",
];

/// Scores tool selection, parameters, efficiency and use of results against
/// each turn's expected calls
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolUsageEvaluator;

impl ToolUsageEvaluator {
    fn score_turn(&self, view: &TurnView<'_>, feedback: &mut Vec<String>) -> Vec<CriterionScore> {
        let expected = &view.turn.expected_tool_calls;
        let actual = &view.invocations;
        let turn = view.index + 1;

        let uniform = |score: f64| {
            vec![
                CriterionScore::new("selection", SELECTION, score),
                CriterionScore::new("parameters", PARAMETERS, score),
                CriterionScore::new("efficiency", EFFICIENCY, score),
                CriterionScore::new("interpretation", INTERPRETATION, score),
            ]
        };

        match (expected.is_empty(), actual.is_empty()) {
            (true, true) => return uniform(1.0),
            (true, false) => {
                feedback.push(format!("turn {}: tools used when none were needed", turn));
                return uniform(0.0);
            }
            (false, true) => {
                feedback.push(format!("turn {}: expected tools were not used", turn));
                return uniform(0.0);
            }
            (false, false) => {}
        }

        let expected_ids: BTreeSet<&str> = expected.iter().map(|c| c.tool_id.as_str()).collect();
        let (relevant, unnecessary): (Vec<&ToolInvocation>, Vec<&ToolInvocation>) = actual
            .iter()
            .copied()
            .partition(|i| expected_ids.contains(i.tool_id.as_str()));

        let used: BTreeSet<&str> = relevant.iter().map(|i| i.tool_id.as_str()).collect();
        let coverage = text::ratio(used.len(), expected_ids.len());
        let penalty = (UNNECESSARY_PENALTY * unnecessary.len() as f64).min(1.0);
        let selection = coverage - penalty / 3.0;
        for missing in expected_ids.difference(&used) {
            feedback.push(format!("turn {}: did not call {}", turn, missing));
        }
        if !unnecessary.is_empty() {
            feedback.push(format!(
                "turn {}: {} unnecessary call(s)",
                turn,
                unnecessary.len()
            ));
        }

        let parameters = if relevant.is_empty() {
            0.0
        } else {
            relevant
                .iter()
                .map(|i| parameter_score(i, expected))
                .sum::<f64>()
                / relevant.len() as f64
        };

        let efficiency = efficiency(relevant.len(), unnecessary.len(), expected.len(), actual);

        let content = view.final_content().to_lowercase();
        let interpretation = if relevant.is_empty() {
            0.0
        } else {
            let reflected = relevant.iter().filter(|i| reflected_in(&content, i)).count();
            if reflected < relevant.len() {
                feedback.push(format!(
                    "turn {}: {}/{} tool results reflected in the answer",
                    turn,
                    reflected,
                    relevant.len()
                ));
            }
            text::ratio(reflected, relevant.len())
        };

        vec![
            CriterionScore::new("selection", SELECTION, selection),
            CriterionScore::new("parameters", PARAMETERS, parameters),
            CriterionScore::new("efficiency", EFFICIENCY, efficiency),
            CriterionScore::new("interpretation", INTERPRETATION, interpretation),
        ]
    }
}

impl Evaluator for ToolUsageEvaluator {
    fn dimension(&self) -> Dimension {
        Dimension::ToolUsage
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore {
        let mut feedback = Vec::new();
        let per_turn: Vec<_> = ctx
            .turns()
            .iter()
            .map(|view| self.score_turn(view, &mut feedback))
            .collect();
        if feedback.is_empty() {
            feedback.push("Tool calls matched the expected calls".to_string());
        }
        DimensionScore::from_criteria(self.dimension(), average_criteria(&per_turn), feedback)
    }
}

/// Best match of one call's parameters against the expected calls to the
/// same tool. A call rejected for missing parameters scores zero.
fn parameter_score(invocation: &ToolInvocation, expected: &[ExpectedToolCall]) -> f64 {
    if invocation.error_kind() == Some(ToolErrorKind::InvalidParameters) {
        return 0.0;
    }
    expected
        .iter()
        .filter(|e| e.tool_id == invocation.tool_id)
        .map(|e| match_parameters(&e.parameters, &invocation.parameters))
        .fold(0.0, f64::max)
}

fn match_parameters(expected: &Map<String, Value>, actual: &Map<String, Value>) -> f64 {
    if expected.is_empty() {
        return 1.0;
    }
    let total: f64 = expected
        .iter()
        .map(|(key, want)| match actual.get(key) {
            Some(got) if values_match(want, got) => 1.0,
            Some(got) if !got.is_null() => 0.5,
            _ => 0.0,
        })
        .sum();
    total / expected.len() as f64
}

fn values_match(want: &Value, got: &Value) -> bool {
    match (want, got) {
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            b.trim().parse::<f64>().ok() == a.as_f64()
        }
        _ => want == got,
    }
}

fn efficiency(
    relevant: usize,
    unnecessary: usize,
    expected: usize,
    actual: &[&ToolInvocation],
) -> f64 {
    if relevant == 0 {
        return 0.0;
    }
    let deviation = (relevant.abs_diff(expected) + unnecessary) as f64 / expected.max(1) as f64;
    let mut per_tool: BTreeMap<&str, usize> = BTreeMap::new();
    for invocation in actual {
        *per_tool.entry(invocation.tool_id.as_str()).or_default() += 1;
    }
    let redundant: usize = per_tool
        .values()
        .map(|count| count.saturating_sub(REDUNDANCY_ALLOWANCE))
        .sum();
    let penalty = (REDUNDANCY_PENALTY * redundant as f64).min(MAX_REDUNDANCY_PENALTY);
    ((1.0 - deviation.min(1.0)) - penalty).max(0.0)
}

/// Whether the final answer reflects the tool's output: a scalar from a
/// successful result, or an acknowledgement of a failed call.
fn reflected_in(content: &str, invocation: &ToolInvocation) -> bool {
    match &invocation.outcome {
        Ok(value) => {
            let mut leaves = Vec::new();
            collect_leaves(value, &mut leaves);
            if leaves.iter().any(|leaf| content.contains(leaf.as_str())) {
                return true;
            }
            let tokens = text::distinctive_tokens(&value.to_string());
            let keys = object_keys(value);
            tokens
                .iter()
                .filter(|t| !keys.contains(t.as_str()))
                .any(|t| content.contains(t.as_str()))
        }
        Err(_) => ERROR_ACKNOWLEDGEMENTS.iter().any(|p| content.contains(p)),
    }
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    const MAX_LEAVES: usize = 64;
    if out.len() >= MAX_LEAVES {
        return;
    }
    match value {
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            if s.chars().count() >= 3 && !matches!(s.as_str(), "yes" | "true" | "false") {
                out.push(s);
            }
        }
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

fn object_keys(value: &Value) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                keys.extend(map.keys().map(|k| k.to_lowercase()));
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluators::fixtures::{
        ScriptedTurn, converse, error_outcome, ideal_conversation, kb_result, scheduling_scenario,
        scheduler_result,
    };
    use crate::tool::entities::ToolCall;
    use crate::tool::value_objects::ToolError;
    use serde_json::json;

    fn evaluate(state: &crate::conversation::ConversationState) -> DimensionScore {
        let scenario = scheduling_scenario();
        ToolUsageEvaluator.evaluate(&EvaluationContext::new(&scenario, state))
    }

    #[test]
    fn test_exact_match_scores_high() {
        let scenario = scheduling_scenario();
        let score = evaluate(&ideal_conversation(&scenario));
        assert!(score.score >= 0.9, "score {} ({:?})", score.score, score.feedback);
    }

    #[test]
    fn test_no_tool_calls_scores_low() {
        let scenario = scheduling_scenario();
        let state = converse(
            &scenario,
            vec![
                ScriptedTurn::answer("It usually takes 6-8 weeks."),
                ScriptedTurn::answer("I have noted your demo request."),
            ],
        );
        let score = evaluate(&state);
        assert!(score.score <= 0.3);
    }

    #[test]
    fn test_wrong_tools_score_low() {
        let scenario = scheduling_scenario();
        let catalog = json!({"products": ["Analytics Pro"]});
        let state = converse(
            &scenario,
            vec![
                ScriptedTurn::answer("Analytics Pro is our flagship.").with_call(
                    ToolCall::new("c1", "product_catalog"),
                    Ok(catalog.clone()),
                ),
                ScriptedTurn::answer("Analytics Pro again.").with_call(
                    ToolCall::new("c2", "product_catalog"),
                    Ok(catalog),
                ),
            ],
        );
        let score = evaluate(&state);
        assert!(score.score <= 0.3, "score {}", score.score);
    }

    #[test]
    fn test_redundant_calls_reduce_efficiency() {
        let scenario = scheduling_scenario();
        let kb = || {
            (
                ToolCall::new("k", "knowledge_base").with_arg("query", "implementation timeline"),
                Ok(kb_result()),
            )
        };
        let mut turn = ScriptedTurn::answer("Typical rollout takes 6-8 weeks.");
        for n in 0..4 {
            let (mut call, outcome) = kb();
            call.id = format!("k{}", n);
            turn = turn.with_call(call, outcome);
        }
        let state = converse(
            &scenario,
            vec![
                turn,
                ScriptedTurn::answer("Booked, slot Tuesday 10:00.").with_call(
                    ToolCall::new("s1", "scheduler").with_arg("meeting_type", "demo"),
                    Ok(scheduler_result()),
                ),
            ],
        );
        let score = evaluate(&state);
        assert!(score.criterion("efficiency").unwrap() < 0.6);
        assert_eq!(score.criterion("selection"), Some(1.0));
    }

    #[test]
    fn test_redundancy_penalty_is_capped() {
        let invocations: Vec<ToolInvocation> = (0..12)
            .map(|n| ToolInvocation {
                call_id: format!("k{}", n),
                tool_id: "knowledge_base".into(),
                parameters: Map::new(),
                outcome: Ok(kb_result()),
                latency: std::time::Duration::ZERO,
                turn_index: 0,
            })
            .collect();
        let actual: Vec<&ToolInvocation> = invocations.iter().collect();

        // ten redundant calls would cost 1.25 uncapped
        assert_eq!(efficiency(12, 0, 12, &actual), 0.5);
        assert_eq!(efficiency(4, 0, 4, &actual[..4]), 0.75);
        assert_eq!(efficiency(2, 0, 2, &actual[..2]), 1.0);
    }

    #[test]
    fn test_acknowledged_error_counts_as_interpreted() {
        let scenario = scheduling_scenario();
        let state = converse(
            &scenario,
            vec![
                ScriptedTurn::answer("Our guide says typical rollout takes 6-8 weeks.").with_call(
                    ToolCall::new("c1", "knowledge_base").with_arg("query", "implementation timeline"),
                    Ok(kb_result()),
                ),
                ScriptedTurn::answer("Sorry, the scheduling service is unavailable right now.")
                    .with_call(
                        ToolCall::new("c2", "scheduler").with_arg("meeting_type", "demo"),
                        error_outcome(ToolError::of_kind(
                            ToolErrorKind::ServiceUnavailable,
                            "scheduler",
                        )),
                    ),
            ],
        );
        let score = evaluate(&state);
        assert_eq!(score.criterion("interpretation"), Some(1.0));
    }

    #[test]
    fn test_parameter_matching() {
        let mut expected = Map::new();
        expected.insert("meeting_type".into(), json!("Demo"));
        expected.insert("duration".into(), json!(30));

        let mut actual = Map::new();
        actual.insert("meeting_type".into(), json!("demo"));
        actual.insert("duration".into(), json!("45"));
        assert_eq!(match_parameters(&expected, &actual), 0.75);

        actual.insert("duration".into(), json!("30"));
        assert_eq!(match_parameters(&expected, &actual), 1.0);
        assert_eq!(match_parameters(&Map::new(), &actual), 1.0);
    }

    #[test]
    fn test_missing_required_parameters_score_zero() {
        let invocation = ToolInvocation {
            call_id: "c".into(),
            tool_id: "scheduler".into(),
            parameters: Map::new(),
            outcome: Err(ToolError::invalid_parameters("scheduler", &["meeting_type".into()])),
            latency: std::time::Duration::ZERO,
            turn_index: 0,
        };
        let expected = vec![ExpectedToolCall::new("scheduler")];
        assert_eq!(parameter_score(&invocation, &expected), 0.0);
    }
}
