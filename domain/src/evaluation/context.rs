//! Read-only views over a completed conversation

use crate::conversation::{ConversationState, TurnRecord};
use crate::evaluation::dimension::CriterionScore;
use crate::scenario::{Scenario, Turn};
use crate::tool::value_objects::ToolInvocation;

/// Input to every evaluator: the scenario script and the conversation it
/// produced
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub scenario: &'a Scenario,
    pub state: &'a ConversationState,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(scenario: &'a Scenario, state: &'a ConversationState) -> Self {
        Self { scenario, state }
    }

    /// One view per scripted turn, in order
    pub fn turns(&self) -> Vec<TurnView<'a>> {
        self.scenario
            .turns
            .iter()
            .enumerate()
            .map(|(index, turn)| TurnView {
                index,
                turn,
                record: self.state.turn(index),
                invocations: self.state.invocations_for_turn(index).collect(),
            })
            .collect()
    }

    /// Turn-final assistant responses joined into one transcript
    pub fn joined_final_responses(&self) -> String {
        self.state
            .turns()
            .iter()
            .map(|t| t.final_content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn invocations(&self) -> &'a [ToolInvocation] {
        self.state.invocations()
    }
}

/// One scripted turn together with what happened during it
#[derive(Debug, Clone)]
pub struct TurnView<'a> {
    pub index: usize,
    pub turn: &'a Turn,
    /// Missing when the conversation never reached this turn
    pub record: Option<&'a TurnRecord>,
    pub invocations: Vec<&'a ToolInvocation>,
}

impl TurnView<'_> {
    pub fn final_content(&self) -> &str {
        self.record.map(|r| r.final_content.as_str()).unwrap_or("")
    }
}

/// Average criterion scores across turns, keeping the first turn's order
///
/// Turn scorers emit the same criteria with the same weights every turn.
pub fn average_criteria(per_turn: &[Vec<CriterionScore>]) -> Vec<CriterionScore> {
    let Some(first) = per_turn.first() else {
        return Vec::new();
    };
    first
        .iter()
        .map(|criterion| {
            let scores: Vec<f64> = per_turn
                .iter()
                .filter_map(|turn| turn.iter().find(|c| c.name == criterion.name))
                .map(|c| c.score)
                .collect();
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            CriterionScore::new(criterion.name.clone(), criterion.weight, mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ModelResponse, TurnEnd};
    use crate::scenario::Turn;

    #[test]
    fn test_turn_views_cover_unreached_turns() {
        let scenario = Scenario::new("s", "S")
            .with_turn(Turn::new("first"))
            .with_turn(Turn::new("second"));
        let mut state = ConversationState::new();
        state.begin_turn(0, "first").unwrap();
        state.record_response(&ModelResponse::text("answer one")).unwrap();
        state.finish_turn(TurnEnd::Final).unwrap();

        let ctx = EvaluationContext::new(&scenario, &state);
        let views = ctx.turns();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].final_content(), "answer one");
        assert!(views[1].record.is_none());
        assert_eq!(views[1].final_content(), "");
        assert_eq!(ctx.joined_final_responses(), "answer one");
    }

    #[test]
    fn test_average_criteria() {
        let per_turn = vec![
            vec![CriterionScore::new("a", 0.5, 1.0), CriterionScore::new("b", 0.5, 0.0)],
            vec![CriterionScore::new("a", 0.5, 0.5), CriterionScore::new("b", 0.5, 1.0)],
        ];
        let averaged = average_criteria(&per_turn);
        assert_eq!(averaged[0].score, 0.75);
        assert_eq!(averaged[1].score, 0.5);
        assert!(average_criteria(&[]).is_empty());
    }
}
