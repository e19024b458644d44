//! Scenario entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Scenario difficulty; scales the performance thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool call a correct answer to a turn would make
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedToolCall {
    pub tool_id: String,
    /// Values the call should carry; empty means any parameters are acceptable
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ExpectedToolCall {
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// One user-message step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user_message: String,
    #[serde(default)]
    pub expected_tool_calls: Vec<ExpectedToolCall>,
    /// Facts the turn-final response should state, as `"key: value"`
    #[serde(default)]
    pub expected_facts: Vec<String>,
    /// Elements the turn-final response must contain
    #[serde(default)]
    pub required_elements: Vec<String>,
}

impl Turn {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            expected_tool_calls: Vec::new(),
            expected_facts: Vec::new(),
            required_elements: Vec::new(),
        }
    }

    pub fn expect_tool(mut self, call: ExpectedToolCall) -> Self {
        self.expected_tool_calls.push(call);
        self
    }

    pub fn expect_fact(mut self, fact: impl Into<String>) -> Self {
        self.expected_facts.push(fact.into());
        self
    }

    pub fn require_element(mut self, element: impl Into<String>) -> Self {
        self.required_elements.push(element.into());
        self
    }

    /// Distinct expected tool ids for this turn
    pub fn expected_tool_ids(&self) -> BTreeSet<&str> {
        self.expected_tool_calls
            .iter()
            .map(|c| c.tool_id.as_str())
            .collect()
    }
}

/// Scenario-wide evaluation criteria
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundTruth {
    pub business_objective: Option<String>,
    pub action_items: Vec<String>,
    pub domain_knowledge: Vec<String>,
    /// Tools whose use signals business leverage
    pub relevant_tools: Vec<String>,
    /// e.g. "professional", "friendly", "formal", "empathetic", "direct"
    pub expected_tone: Option<String>,
    pub communication_guidelines: Vec<String>,
}

/// Who the simulated customer is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerContext {
    /// e.g. "enterprise", "small_business", "individual"
    pub customer_type: Option<String>,
    pub industry: Option<String>,
}

/// Immutable multi-turn conversation script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub complexity: Complexity,
    /// Tools offered to the model in this scenario
    #[serde(default)]
    pub tools: Vec<String>,
    /// Optional system prompt sent before the first user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub ground_truth: GroundTruth,
    #[serde(default)]
    pub customer: CustomerContext,
}

impl Scenario {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            industry: String::new(),
            complexity: Complexity::default(),
            tools: Vec::new(),
            system_prompt: None,
            turns: Vec::new(),
            ground_truth: GroundTruth::default(),
            customer: CustomerContext::default(),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_ground_truth(mut self, ground_truth: GroundTruth) -> Self {
        self.ground_truth = ground_truth;
        self
    }

    /// Union of the tools expected across all turns
    pub fn expected_tool_ids(&self) -> BTreeSet<&str> {
        self.turns
            .iter()
            .flat_map(|t| t.expected_tool_calls.iter().map(|c| c.tool_id.as_str()))
            .collect()
    }

    /// Tools offered to the model: the declared list plus any expected tool
    pub fn offered_tool_ids(&self) -> BTreeSet<&str> {
        let mut ids: BTreeSet<&str> = self.tools.iter().map(String::as_str).collect();
        ids.extend(self.expected_tool_ids());
        ids
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::invalid_scenario(&self.id, "empty id"));
        }
        if self.turns.is_empty() {
            return Err(DomainError::invalid_scenario(&self.id, "no turns"));
        }
        if let Some(index) = self
            .turns
            .iter()
            .position(|t| t.user_message.trim().is_empty())
        {
            return Err(DomainError::invalid_scenario(
                &self.id,
                format!("turn {} has an empty user message", index),
            ));
        }
        if !self.tools.is_empty()
            && let Some(tool) = self
                .expected_tool_ids()
                .into_iter()
                .find(|id| !self.tools.iter().any(|t| t == id))
        {
            return Err(DomainError::invalid_scenario(
                &self.id,
                format!("expected tool '{}' is not offered", tool),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduling() -> Scenario {
        Scenario::new("appointment", "Appointment scheduling")
            .with_tools(["knowledge_base", "scheduler"])
            .with_turn(
                Turn::new("What onboarding options do you offer?")
                    .expect_tool(ExpectedToolCall::new("knowledge_base")),
            )
            .with_turn(
                Turn::new("Book a demo next Tuesday.").expect_tool(
                    ExpectedToolCall::new("scheduler").with_param("meeting_type", "demo"),
                ),
            )
    }

    #[test]
    fn test_valid_scenario() {
        let scenario = scheduling();
        assert!(scenario.validate().is_ok());
        let expected: Vec<_> = scenario.expected_tool_ids().into_iter().collect();
        assert_eq!(expected, vec!["knowledge_base", "scheduler"]);
    }

    #[test]
    fn test_rejects_empty_turns() {
        let err = Scenario::new("empty", "Empty").validate().unwrap_err();
        assert!(err.to_string().contains("no turns"));
    }

    #[test]
    fn test_rejects_expected_tool_not_offered() {
        let scenario = scheduling().with_tools(["knowledge_base"]);
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("scheduler"));
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let json = r#"{
            "id": "s1",
            "name": "Minimal",
            "turns": [{"user_message": "Hello"}]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.complexity, Complexity::Medium);
        assert!(scenario.turns[0].expected_tool_calls.is_empty());
        assert!(scenario.ground_truth.business_objective.is_none());
    }

    #[test]
    fn test_offered_tools_include_expected() {
        let scenario = Scenario::new("s", "S")
            .with_turn(Turn::new("hi").expect_tool(ExpectedToolCall::new("scheduler")));
        assert!(scenario.offered_tool_ids().contains("scheduler"));
    }
}
