use crate::evaluation::context::{EvaluationContext, TurnView, average_criteria};
use crate::evaluation::dimension::{CriterionScore, Dimension, DimensionScore};
use crate::evaluation::evaluator::Evaluator;
use crate::evaluation::text;

const FACTUAL_ACCURACY: f64 = 0.4;
const COMPLETENESS: f64 = 0.3;
const RELEVANCE: f64 = 0.3;

/// Share of a target's key terms that must appear for it to count as stated
const COVERAGE_THRESHOLD: f64 = 0.7;

/// Factual accuracy, completeness and relevance of each turn-final answer
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseQualityEvaluator;

impl ResponseQualityEvaluator {
    fn score_turn(&self, view: &TurnView<'_>, feedback: &mut Vec<String>) -> Vec<CriterionScore> {
        let content = view.final_content();
        if content.trim().is_empty() {
            feedback.push(format!("turn {}: no final response", view.index + 1));
            return vec![
                CriterionScore::new("factual_accuracy", FACTUAL_ACCURACY, 0.0),
                CriterionScore::new("completeness", COMPLETENESS, 0.0),
                CriterionScore::new("relevance", RELEVANCE, 0.0),
            ];
        }

        vec![
            CriterionScore::new(
                "factual_accuracy",
                FACTUAL_ACCURACY,
                factual_accuracy(content, &view.turn.expected_facts, view.index, feedback),
            ),
            CriterionScore::new(
                "completeness",
                COMPLETENESS,
                completeness(content, &view.turn.required_elements, view.index, feedback),
            ),
            CriterionScore::new(
                "relevance",
                RELEVANCE,
                relevance(content, &view.turn.user_message),
            ),
        ]
    }
}

impl Evaluator for ResponseQualityEvaluator {
    fn dimension(&self) -> Dimension {
        Dimension::ResponseQuality
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore {
        let mut feedback = Vec::new();
        let per_turn: Vec<_> = ctx
            .turns()
            .iter()
            .map(|view| self.score_turn(view, &mut feedback))
            .collect();
        let criteria = average_criteria(&per_turn);
        if feedback.is_empty() {
            feedback.push("All expected facts and required elements were covered".to_string());
        }
        DimensionScore::from_criteria(self.dimension(), criteria, feedback)
    }
}

/// `"key: value"` split; a fact without a colon is all key
fn split_fact(fact: &str) -> (&str, Option<&str>) {
    match fact.split_once(':') {
        Some((key, value)) if !value.trim().is_empty() => (key.trim(), Some(value.trim())),
        Some((key, _)) => (key.trim(), None),
        None => (fact.trim(), None),
    }
}

fn factual_accuracy(content: &str, facts: &[String], turn: usize, feedback: &mut Vec<String>) -> f64 {
    if facts.is_empty() {
        return 1.0;
    }
    let mut correct = 0usize;
    let mut incorrect = 0usize;
    for fact in facts {
        let (key, value) = split_fact(fact);
        let key_stated = text::covers(content, key, COVERAGE_THRESHOLD);
        match value {
            Some(value) if text::covers(content, value, COVERAGE_THRESHOLD) => correct += 1,
            Some(_) if key_stated => {
                incorrect += 1;
                feedback.push(format!("turn {}: incorrect value for '{}'", turn + 1, key));
            }
            None if key_stated => correct += 1,
            _ => feedback.push(format!("turn {}: missing fact '{}'", turn + 1, fact)),
        }
    }
    let ratio = text::ratio(correct, facts.len());
    match (incorrect, ratio) {
        (0, r) if r >= 0.9 => 1.0,
        (0..=1, r) if r >= 0.8 => 0.75,
        (0..=2, r) if r >= 0.6 => 0.5,
        (_, r) if r >= 0.4 => 0.25,
        _ => 0.0,
    }
}

fn completeness(content: &str, required: &[String], turn: usize, feedback: &mut Vec<String>) -> f64 {
    if required.is_empty() {
        return 1.0;
    }
    let missing: Vec<&str> = required
        .iter()
        .filter(|element| !text::covers(content, element, COVERAGE_THRESHOLD))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        feedback.push(format!("turn {}: missing {}", turn + 1, missing.join(", ")));
    }
    let ratio = text::ratio(required.len() - missing.len(), required.len());
    if ratio >= 1.0 {
        1.0
    } else if ratio >= 0.8 {
        2.0 / 3.0
    } else if ratio >= 0.5 {
        1.0 / 3.0
    } else {
        0.0
    }
}

fn relevance(content: &str, user_message: &str) -> f64 {
    let terms = text::key_terms(user_message);
    if terms.is_empty() {
        return 1.0;
    }
    let lower = content.to_lowercase();
    let addressed = terms.iter().filter(|t| text::term_present(&lower, t)).count();
    let addressed_ratio = text::ratio(addressed, terms.len());

    let sentences = text::sentences(content);
    let off_topic = sentences
        .iter()
        .filter(|s| {
            let sentence = s.to_lowercase();
            !terms.iter().any(|t| text::term_present(&sentence, t))
        })
        .count();
    let off_topic_ratio = if sentences.is_empty() {
        0.0
    } else {
        off_topic as f64 / sentences.len() as f64
    };

    if addressed_ratio >= 0.8 && off_topic_ratio <= 0.1 {
        1.0
    } else if addressed_ratio >= 0.5 && off_topic_ratio <= 0.3 {
        0.5
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluators::fixtures::{
        ScriptedTurn, converse, ideal_conversation, scheduling_scenario,
    };

    #[test]
    fn test_ideal_conversation_scores_high() {
        let scenario = scheduling_scenario();
        let state = ideal_conversation(&scenario);
        let score = ResponseQualityEvaluator.evaluate(&EvaluationContext::new(&scenario, &state));
        assert!(score.score >= 0.7, "score {} ({:?})", score.score, score.feedback);
        assert_eq!(score.criterion("factual_accuracy"), Some(1.0));
        assert_eq!(score.criterion("completeness"), Some(1.0));
    }

    #[test]
    fn test_wrong_value_is_penalized() {
        let scenario = scheduling_scenario();
        let state = converse(
            &scenario,
            vec![
                ScriptedTurn::answer("The implementation timeline is around 6 months."),
                ScriptedTurn::answer("Your demo meeting is set for Tuesday."),
            ],
        );
        let score = ResponseQualityEvaluator.evaluate(&EvaluationContext::new(&scenario, &state));
        let accuracy = score.criterion("factual_accuracy").unwrap();
        assert!(accuracy < 1.0);
        assert!(score.feedback.iter().any(|f| f.contains("incorrect value")));
    }

    #[test]
    fn test_empty_answers_score_zero() {
        let scenario = scheduling_scenario();
        let state = converse(
            &scenario,
            vec![ScriptedTurn::answer(""), ScriptedTurn::answer("")],
        );
        let score = ResponseQualityEvaluator.evaluate(&EvaluationContext::new(&scenario, &state));
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_split_fact() {
        assert_eq!(split_fact("duration: 30 minutes"), ("duration", Some("30 minutes")));
        assert_eq!(split_fact("free trial"), ("free trial", None));
        assert_eq!(split_fact("price:"), ("price", None));
    }

    #[test]
    fn test_relevance_bands() {
        let query = "What pricing options exist for enterprise customers?";
        assert_eq!(
            relevance("Enterprise pricing options start at $500 for customers.", query),
            1.0
        );
        assert_eq!(relevance("The weather is lovely today.", query), 0.0);
    }
}
