use crate::evaluation::context::EvaluationContext;
use crate::evaluation::dimension::{CriterionScore, Dimension, DimensionScore};
use crate::evaluation::evaluator::Evaluator;
use crate::evaluation::text;
use std::collections::BTreeSet;

const OBJECTIVE: f64 = 0.35;
const ACTIONABILITY: f64 = 0.25;
const DOMAIN_ACUMEN: f64 = 0.25;
const TOOL_LEVERAGE: f64 = 0.15;

const ITEM_THRESHOLD: f64 = 0.7;

/// Whether the conversation as a whole served the scenario's business goal.
///
/// Looks at every turn-final answer together, since objectives and action
/// items are scenario-wide. A criterion without ground truth is not held
/// against the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessValueEvaluator;

impl Evaluator for BusinessValueEvaluator {
    fn dimension(&self) -> Dimension {
        Dimension::BusinessValue
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore {
        let truth = &ctx.scenario.ground_truth;
        let transcript = ctx.joined_final_responses();
        let mut feedback = Vec::new();

        if transcript.trim().is_empty() {
            feedback.push("No answers to assess".to_string());
            return DimensionScore::from_criteria(
                self.dimension(),
                vec![
                    CriterionScore::new("objective", OBJECTIVE, 0.0),
                    CriterionScore::new("actionability", ACTIONABILITY, 0.0),
                    CriterionScore::new("domain_acumen", DOMAIN_ACUMEN, 0.0),
                    CriterionScore::new("tool_leverage", TOOL_LEVERAGE, 0.0),
                ],
                feedback,
            );
        }

        let objective = match &truth.business_objective {
            Some(objective) => {
                let score = objective_score(&transcript, objective);
                if score < 1.0 {
                    feedback.push(format!("Objective only partly addressed: {}", objective));
                }
                score
            }
            None => 1.0,
        };

        let actionability = coverage_band(&transcript, &truth.action_items);
        if actionability < 1.0 {
            feedback.push("Some expected action items were not offered".to_string());
        }
        let acumen = coverage_band(&transcript, &truth.domain_knowledge);
        if acumen < 1.0 {
            feedback.push("Some expected domain knowledge was not shown".to_string());
        }

        let tool_leverage = if truth.relevant_tools.is_empty() {
            1.0
        } else {
            let used: BTreeSet<&str> = ctx
                .invocations()
                .iter()
                .map(|i| i.tool_id.as_str())
                .collect();
            let leveraged = truth
                .relevant_tools
                .iter()
                .filter(|t| used.contains(t.as_str()))
                .count();
            text::ratio(leveraged, truth.relevant_tools.len())
        };

        if feedback.is_empty() {
            feedback.push("Conversation served the business objective".to_string());
        }

        DimensionScore::from_criteria(
            self.dimension(),
            vec![
                CriterionScore::new("objective", OBJECTIVE, objective),
                CriterionScore::new("actionability", ACTIONABILITY, actionability),
                CriterionScore::new("domain_acumen", DOMAIN_ACUMEN, acumen),
                CriterionScore::new("tool_leverage", TOOL_LEVERAGE, tool_leverage),
            ],
            feedback,
        )
    }
}

/// All key terms present scores full; partial matches fall into bands
fn objective_score(transcript: &str, objective: &str) -> f64 {
    let terms = text::key_terms(objective);
    if terms.is_empty() {
        return if text::covers(transcript, objective, 1.0) { 1.0 } else { 0.0 };
    }
    let lower = transcript.to_lowercase();
    let matched = terms.iter().filter(|t| text::term_present(&lower, t)).count();
    match text::ratio(matched, terms.len()) {
        r if r >= 1.0 => 1.0,
        r if r >= 0.7 => 0.75,
        r if r >= 0.5 => 0.5,
        r if r >= 0.3 => 0.25,
        _ => 0.0,
    }
}

fn coverage_band(transcript: &str, items: &[String]) -> f64 {
    if items.is_empty() {
        return 1.0;
    }
    let covered = items
        .iter()
        .filter(|item| text::covers(transcript, item, ITEM_THRESHOLD))
        .count();
    match text::ratio(covered, items.len()) {
        r if r >= 0.8 => 1.0,
        r if r >= 0.5 => 2.0 / 3.0,
        r if r > 0.0 => 1.0 / 3.0,
        _ => 0.0,
    }
}
