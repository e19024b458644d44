//! Document retrieval: keyword search over company documentation

use super::simulated::{SimulatedTool, ToolDataError, string_list, string_param, usize_param};
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const DOCUMENT_RETRIEVAL: &str = "document_retrieval";

const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
struct Document {
    id: String,
    title: String,
    version: String,
    sections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
struct Section {
    title: String,
    content: String,
    keywords: Vec<String>,
}

impl Section {
    /// Relevance in `[0, 1]`: tagged keyword hits weigh 5, content
    /// occurrences 2, title occurrences 3, and a multi-word keyword whose
    /// words all appear in the content adds 1. Normalized by 10 per keyword.
    fn relevance(&self, keywords: &[String]) -> f64 {
        let content = self.content.to_lowercase();
        let title = self.title.to_lowercase();
        let tagged: Vec<String> = self.keywords.iter().map(|k| k.to_lowercase()).collect();

        let total: usize = keywords
            .iter()
            .map(|k| k.to_lowercase())
            .map(|k| {
                let direct = if tagged.contains(&k) { 5 } else { 0 };
                let partial = k.contains(' ')
                    && k.split_whitespace().all(|part| content.contains(part));
                direct
                    + content.matches(k.as_str()).count() * 2
                    + title.matches(k.as_str()).count() * 3
                    + usize::from(partial)
            })
            .sum();

        (total as f64 / (keywords.len() * 10) as f64).min(1.0)
    }
}

#[derive(Debug, Serialize)]
struct Match<'a> {
    document_id: &'a str,
    document_title: &'a str,
    document_version: &'a str,
    section_title: &'a str,
    content: &'a str,
    relevance_score: f64,
}

/// Get the tool definition for document_retrieval
pub fn document_retrieval_definition() -> ToolDefinition {
    ToolDefinition::new(
        DOCUMENT_RETRIEVAL,
        "Retrieve company documentation including technical documentation, legal documents, compliance guides and API references",
    )
    .with_parameter(
        ToolParameter::new(
            "document_type",
            "Type of document to retrieve (e.g., 'technical_documentation', 'legal_documentation', 'compliance_documentation', 'api_reference')",
            true,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("keywords", "Keywords to search for in documents", true)
            .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new(
            "version",
            "Specific version of documentation to retrieve",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "max_results",
            "Maximum number of results to return (default: 5)",
            false,
        )
        .with_type("integer"),
    )
}

pub struct DocumentRetrieval {
    library: BTreeMap<String, Vec<Document>>,
}

impl DocumentRetrieval {
    pub fn new() -> Result<Self, ToolDataError> {
        let library = serde_json::from_str(include_str!("data/documents.json"))
            .map_err(|e| ToolDataError::new(DOCUMENT_RETRIEVAL, e))?;
        Ok(Self { library })
    }
}

impl SimulatedTool for DocumentRetrieval {
    fn definition(&self) -> ToolDefinition {
        document_retrieval_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let document_type = string_param(parameters, "document_type").ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::InvalidParameters,
                "document_type must be a non-empty string",
            )
        })?;
        let keywords = string_list(parameters, "keywords");
        if keywords.is_empty() {
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                "keywords must contain at least one keyword",
            ));
        }
        let version = string_param(parameters, "version");
        let max_results = usize_param(parameters, "max_results", DEFAULT_MAX_RESULTS)?;

        let Some(documents) = self.library.get(document_type) else {
            let available: Vec<&str> = self.library.keys().map(String::as_str).collect();
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                format!(
                    "Unknown document type '{}'; available types: {}",
                    document_type,
                    available.join(", ")
                ),
            ));
        };

        let documents: Vec<&Document> = documents
            .iter()
            .filter(|d| version.is_none_or(|v| d.version == v))
            .collect();
        if documents.is_empty() {
            return Ok(json!({
                "found": false,
                "document_type": document_type,
                "message": match version {
                    Some(v) => format!("No {} documents with version '{}'", document_type, v),
                    None => format!("No {} documents", document_type),
                },
            }));
        }

        let mut matches: Vec<Match> = documents
            .iter()
            .flat_map(|doc| doc.sections.iter().map(move |section| (*doc, section)))
            .filter_map(|(doc, section)| {
                let relevance_score = section.relevance(&keywords);
                (relevance_score > 0.0).then_some(Match {
                    document_id: &doc.id,
                    document_title: &doc.title,
                    document_version: &doc.version,
                    section_title: &section.title,
                    content: &section.content,
                    relevance_score,
                })
            })
            .collect();
        // stable sort keeps document order among equal scores
        matches.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        matches.truncate(max_results);

        Ok(json!({
            "found": !matches.is_empty(),
            "document_type": document_type,
            "count": matches.len(),
            "matching_sections": matches,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieve(params: Value) -> ToolOutcome {
        let Value::Object(map) = params else {
            unreachable!()
        };
        DocumentRetrieval::new().unwrap().execute(&map)
    }

    #[test]
    fn test_sections_ranked_by_relevance() {
        let result = retrieve(json!({
            "document_type": "technical_documentation",
            "keywords": ["known issues", "memory leak"]
        }))
        .unwrap();
        assert_eq!(result["found"], true);
        let sections = result["matching_sections"].as_array().unwrap();
        assert_eq!(sections[0]["section_title"], "Known Issues");
        assert!(sections[0]["content"].as_str().unwrap().contains("4.2.2"));
        assert_eq!(sections[1]["section_title"], "Inventory Batch API");
        let scores: Vec<f64> = sections
            .iter()
            .map(|s| s["relevance_score"].as_f64().unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores[0] <= 1.0);
    }

    #[test]
    fn test_compliance_documentation_covers_finra() {
        let result = retrieve(json!({
            "document_type": "compliance_documentation",
            "keywords": ["FINRA", "Rule 3110", "supervision"],
            "max_results": 1
        }))
        .unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(
            result["matching_sections"][0]["section_title"],
            "FINRA Rule 3110 Supervision"
        );
    }

    #[test]
    fn test_version_filter() {
        let result = retrieve(json!({
            "document_type": "technical_documentation",
            "keywords": ["batch"],
            "version": "1.0.0"
        }))
        .unwrap();
        assert_eq!(result["found"], false);
    }

    #[test]
    fn test_no_keyword_match_is_not_an_error() {
        let result = retrieve(json!({
            "document_type": "api_reference",
            "keywords": ["zeppelin"]
        }))
        .unwrap();
        assert_eq!(result["found"], false);
        assert_eq!(result["count"], 0);
    }

    #[test]
    fn test_unknown_type_lists_available() {
        let err = retrieve(json!({"document_type": "recipes", "keywords": ["pie"]})).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidParameters);
        assert!(err.message.contains("legal_documentation"));
    }

    #[test]
    fn test_keywords_required() {
        let err = retrieve(json!({"document_type": "api_reference", "keywords": []})).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidParameters);
    }
}
