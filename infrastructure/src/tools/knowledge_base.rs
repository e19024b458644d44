//! Knowledge base: keyword search over company articles

use super::simulated::{SimulatedTool, ToolDataError, string_list, usize_param};
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const KNOWLEDGE_BASE: &str = "knowledge_base";

const DEFAULT_MAX_RESULTS: usize = 3;
const CATEGORY_BONUS: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Article {
    id: String,
    question: String,
    answer: String,
    categories: Vec<String>,
}

impl Article {
    fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.question,
            self.answer,
            self.categories.join(" ")
        )
        .to_lowercase()
    }
}

/// Get the tool definition for knowledge_base
pub fn knowledge_base_definition() -> ToolDefinition {
    ToolDefinition::new(
        KNOWLEDGE_BASE,
        "Search the company knowledge base for information about products, services, policies, and procedures",
    )
    .with_parameter(ToolParameter::new("query", "Search query string", true).with_type("string"))
    .with_parameter(
        ToolParameter::new(
            "categories",
            "Categories to search within (e.g., 'implementation', 'support', 'policies')",
            false,
        )
        .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new(
            "max_results",
            "Maximum number of results to return (default: 3)",
            false,
        )
        .with_type("integer"),
    )
}

pub struct KnowledgeBase {
    articles: Vec<Article>,
}

impl KnowledgeBase {
    pub fn new() -> Result<Self, ToolDataError> {
        let articles = serde_json::from_str(include_str!("data/knowledge_base.json"))
            .map_err(|e| ToolDataError::new(KNOWLEDGE_BASE, e))?;
        Ok(Self { articles })
    }
}

impl SimulatedTool for KnowledgeBase {
    fn definition(&self) -> ToolDefinition {
        knowledge_base_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let query = parameters
            .get("query")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                ToolError::new(ToolErrorKind::InvalidParameters, "query must be a non-empty string")
            })?;
        let categories = string_list(parameters, "categories");
        let max_results = usize_param(parameters, "max_results", DEFAULT_MAX_RESULTS)?;

        let terms: Vec<&str> = query.split_whitespace().collect();
        let mut scored: Vec<(f64, &Article)> = self
            .articles
            .iter()
            .filter(|a| {
                categories.is_empty() || a.categories.iter().any(|c| categories.contains(c))
            })
            .filter_map(|article| {
                let text = article.searchable_text();
                let matches = terms.iter().filter(|t| text.contains(*t)).count();
                if matches == 0 {
                    return None;
                }
                let mut relevance = matches as f64 / terms.len() as f64;
                if !categories.is_empty() {
                    let hits = categories
                        .iter()
                        .filter(|c| article.categories.contains(c))
                        .count();
                    relevance += CATEGORY_BONUS * hits as f64 / categories.len() as f64;
                }
                Some((relevance, article))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        let results: Vec<&Article> = scored
            .into_iter()
            .take(max_results)
            .map(|(_, a)| a)
            .collect();

        if results.is_empty() {
            return Ok(json!({
                "query": query,
                "results": [],
                "message": "No articles matched the query",
            }));
        }
        Ok(json!({
            "query": query,
            "results": results,
            "total": results.len(),
        }))
    }
}
