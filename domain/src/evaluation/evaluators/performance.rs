use crate::evaluation::context::{EvaluationContext, TurnView, average_criteria};
use crate::evaluation::dimension::{CriterionScore, Dimension, DimensionScore};
use crate::evaluation::evaluator::Evaluator;
use crate::scenario::Complexity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const LATENCY: f64 = 0.6;
const COMPLETION_TOKENS: f64 = 0.4;

/// Floors and ceilings of the saturating performance scale, for a
/// medium-complexity scenario. Simple scenarios get 0.6x these values,
/// complex ones 1.6x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    /// Model time per turn at or below which latency scores 1
    pub latency_floor_ms: u64,
    /// Model time per turn at or above which latency scores 0
    pub latency_ceiling_ms: u64,
    pub completion_tokens_floor: u32,
    pub completion_tokens_ceiling: u32,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            latency_floor_ms: 2_500,
            latency_ceiling_ms: 12_000,
            completion_tokens_floor: 250,
            completion_tokens_ceiling: 1_000,
        }
    }
}

impl PerformanceThresholds {
    pub fn for_complexity(&self, complexity: Complexity) -> Self {
        let factor = match complexity {
            Complexity::Simple => 0.6,
            Complexity::Medium => 1.0,
            Complexity::Complex => 1.6,
        };
        let scale = |v: f64| (v * factor).round();
        Self {
            latency_floor_ms: scale(self.latency_floor_ms as f64) as u64,
            latency_ceiling_ms: scale(self.latency_ceiling_ms as f64) as u64,
            completion_tokens_floor: scale(f64::from(self.completion_tokens_floor)) as u32,
            completion_tokens_ceiling: scale(f64::from(self.completion_tokens_ceiling)) as u32,
        }
    }

    /// Floors must sit strictly below ceilings
    pub fn is_valid(&self) -> bool {
        self.latency_floor_ms < self.latency_ceiling_ms
            && self.completion_tokens_floor < self.completion_tokens_ceiling
    }
}

/// 1 at or below `floor`, 0 at or above `ceiling`, linear in between
pub fn saturating_linear(value: f64, floor: f64, ceiling: f64) -> f64 {
    if value <= floor {
        1.0
    } else if value >= ceiling {
        0.0
    } else {
        1.0 - (value - floor) / (ceiling - floor)
    }
}

/// Scores model latency and output length per turn.
///
/// Reads only the response metadata, never the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceEvaluator {
    thresholds: PerformanceThresholds,
}

impl PerformanceEvaluator {
    pub fn new(thresholds: PerformanceThresholds) -> Self {
        Self { thresholds }
    }

    fn score_turn(
        &self,
        thresholds: &PerformanceThresholds,
        view: &TurnView<'_>,
        feedback: &mut Vec<String>,
    ) -> Vec<CriterionScore> {
        let responses = view.record.map(|r| r.responses.as_slice()).unwrap_or(&[]);
        if responses.is_empty() {
            return vec![
                CriterionScore::new("latency", LATENCY, 0.0),
                CriterionScore::new("completion_tokens", COMPLETION_TOKENS, 0.0),
            ];
        }

        let latency: Duration = responses.iter().map(|r| r.latency).sum();
        let tokens: u64 = responses
            .iter()
            .map(|r| u64::from(r.usage.completion_tokens))
            .sum();

        let latency_score = saturating_linear(
            latency.as_millis() as f64,
            thresholds.latency_floor_ms as f64,
            thresholds.latency_ceiling_ms as f64,
        );
        let token_score = saturating_linear(
            tokens as f64,
            f64::from(thresholds.completion_tokens_floor),
            f64::from(thresholds.completion_tokens_ceiling),
        );
        if latency_score < 0.5 {
            feedback.push(format!(
                "turn {}: slow response ({} ms)",
                view.index + 1,
                latency.as_millis()
            ));
        }
        if token_score < 0.5 {
            feedback.push(format!("turn {}: verbose response ({} tokens)", view.index + 1, tokens));
        }

        vec![
            CriterionScore::new("latency", LATENCY, latency_score),
            CriterionScore::new("completion_tokens", COMPLETION_TOKENS, token_score),
        ]
    }
}

impl Evaluator for PerformanceEvaluator {
    fn dimension(&self) -> Dimension {
        Dimension::Performance
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore {
        let thresholds = self.thresholds.for_complexity(ctx.scenario.complexity);
        let mut feedback = Vec::new();
        let per_turn: Vec<_> = ctx
            .turns()
            .iter()
            .map(|view| self.score_turn(&thresholds, view, &mut feedback))
            .collect();
        if feedback.is_empty() {
            feedback.push("Responses were fast and concise".to_string());
        }
        DimensionScore::from_criteria(self.dimension(), average_criteria(&per_turn), feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluators::fixtures::{ScriptedTurn, converse, scheduling_scenario};

    #[test]
    fn test_saturating_linear() {
        assert_eq!(saturating_linear(100.0, 200.0, 600.0), 1.0);
        assert_eq!(saturating_linear(200.0, 200.0, 600.0), 1.0);
        assert_eq!(saturating_linear(400.0, 200.0, 600.0), 0.5);
        assert_eq!(saturating_linear(600.0, 200.0, 600.0), 0.0);
        assert_eq!(saturating_linear(9_000.0, 200.0, 600.0), 0.0);
    }

    #[test]
    fn test_complexity_scaling() {
        let base = PerformanceThresholds::default();
        let simple = base.for_complexity(Complexity::Simple);
        assert_eq!(simple.latency_floor_ms, 1_500);
        let complex = base.for_complexity(Complexity::Complex);
        assert_eq!(complex.latency_ceiling_ms, 19_200);
        assert!(simple.is_valid() && complex.is_valid());
    }

    #[test]
    fn test_fast_turns_score_full() {
        let scenario = scheduling_scenario();
        let state = converse(
            &scenario,
            vec![ScriptedTurn::answer("a"), ScriptedTurn::answer("b")],
        );
        let score = PerformanceEvaluator::default().evaluate(&EvaluationContext::new(&scenario, &state));
        assert_eq!(score.score, 1.0);
    }

    #[test]
    fn test_slow_turn_scores_zero_latency() {
        let scenario = scheduling_scenario();
        let mut slow = ScriptedTurn::answer("a");
        slow.latency = Duration::from_secs(30);
        slow.completion_tokens = 5_000;
        let state = converse(&scenario, vec![slow, ScriptedTurn::answer("b")]);
        let score = PerformanceEvaluator::default().evaluate(&EvaluationContext::new(&scenario, &state));
        assert_eq!(score.criterion("latency"), Some(0.5));
        assert_eq!(score.criterion("completion_tokens"), Some(0.5));
        assert!(score.feedback.iter().any(|f| f.contains("slow")));
    }
}
