//! Simulated tool backend
//!
//! [`SimulatedTools`] is the infrastructure adapter for the application
//! layer's [`ToolBackend`] port. It owns one [`SimulatedTool`] per business
//! tool, all backed by embedded JSON data so that runs are reproducible.
//!
//! # Execution Path
//!
//! ```text
//! ToolDispatcher::dispatch()
//!   └─ ToolBackend::execute()  → SimulatedTools
//!        ├─ known tool   → SimulatedTool::execute()
//!        └─ unknown tool → ToolError(tool_not_found)
//! ```

use super::{
    customer_history::CustomerHistory, document_retrieval::DocumentRetrieval,
    knowledge_base::KnowledgeBase, order_management::OrderManagement,
    pricing_calculator::PricingCalculator, product_catalog::ProductCatalog,
    scheduler::Scheduler, support_ticket::SupportTicket,
};
use async_trait::async_trait;
use bizeval_application::ToolBackend;
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolSpec};
use chrono::{Local, NaiveDate, TimeDelta};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// A business tool executing against in-memory data
pub trait SimulatedTool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome;
}

/// Embedded tool data failed to parse
#[derive(Error, Debug)]
#[error("Failed to load data for tool '{tool}': {source}")]
pub struct ToolDataError {
    pub tool: String,
    #[source]
    pub source: serde_json::Error,
}

impl ToolDataError {
    pub fn new(tool: &str, source: serde_json::Error) -> Self {
        Self {
            tool: tool.to_string(),
            source,
        }
    }
}

/// Backend holding the business tools
pub struct SimulatedTools {
    tools: BTreeMap<String, Box<dyn SimulatedTool>>,
    spec: ToolSpec,
}

impl SimulatedTools {
    /// Create the standard backend, with calendars and account histories
    /// anchored at today's local date.
    pub fn standard() -> Result<Self, ToolDataError> {
        Self::standard_at(Local::now().date_naive())
    }

    /// Create the standard backend with a fixed "today"
    pub fn standard_at(today: NaiveDate) -> Result<Self, ToolDataError> {
        Ok(Self::empty()
            .with_tool(KnowledgeBase::new()?)
            .with_tool(ProductCatalog::new()?)
            .with_tool(PricingCalculator::new()?)
            .with_tool(Scheduler::new(today))
            .with_tool(DocumentRetrieval::new()?)
            .with_tool(CustomerHistory::new(today)?)
            .with_tool(OrderManagement::new(today)?)
            .with_tool(SupportTicket::new(today)?))
    }

    pub fn empty() -> Self {
        Self {
            tools: BTreeMap::new(),
            spec: ToolSpec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl SimulatedTool + 'static) -> Self {
        let definition = tool.definition();
        self.tools.insert(definition.name.clone(), Box::new(tool));
        self.spec = self.spec.register(definition);
        self
    }
}

#[async_trait]
impl ToolBackend for SimulatedTools {
    fn definitions(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, tool_id: &str, parameters: &Map<String, Value>) -> ToolOutcome {
        let Some(tool) = self.tools.get(tool_id) else {
            return Err(ToolError::not_found(tool_id));
        };
        let outcome = tool.execute(parameters);
        if let Err(e) = &outcome {
            debug!("Tool {} returned {}", tool_id, e);
        }
        outcome
    }
}

/// Read a parameter that may be a list of strings or a single string
pub(crate) fn string_list(parameters: &Map<String, Value>, key: &str) -> Vec<String> {
    match parameters.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Read a non-negative integer parameter, accepting numeric strings
pub(crate) fn usize_param(
    parameters: &Map<String, Value>,
    key: &str,
    default: usize,
) -> Result<usize, ToolError> {
    let parsed = match parameters.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| {
        ToolError::new(
            ToolErrorKind::InvalidParameters,
            format!("'{}' must be a non-negative integer", key),
        )
    })
}

/// Read an optional string parameter
pub(crate) fn string_param<'a>(parameters: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Read a boolean flag, accepting `"true"`/`"false"` strings
pub(crate) fn bool_param(parameters: &Map<String, Value>, key: &str) -> bool {
    match parameters.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Replace every `{"days_ago": n}` object with the ISO date `n` days
/// before `today` (negative offsets land in the future).
pub(crate) fn anchor_dates(value: &mut Value, today: NaiveDate) {
    match value {
        Value::Object(map) => {
            if map.len() == 1
                && let Some(days) = map.get("days_ago").and_then(Value::as_i64)
                && let Some(date) = today.checked_sub_signed(TimeDelta::days(days))
            {
                *value = Value::String(date.format(DATE_FORMAT).to_string());
                return;
            }
            map.values_mut().for_each(|v| anchor_dates(v, today));
        }
        Value::Array(items) => items.iter_mut().for_each(|v| anchor_dates(v, today)),
        _ => {}
    }
}

/// Parse embedded data after anchoring its relative dates
pub(crate) fn load_anchored<T: serde::de::DeserializeOwned>(
    tool: &str,
    raw: &str,
    today: NaiveDate,
) -> Result<T, ToolDataError> {
    let mut value: Value = serde_json::from_str(raw).map_err(|e| ToolDataError::new(tool, e))?;
    anchor_dates(&mut value, today);
    serde_json::from_value(value).map_err(|e| ToolDataError::new(tool, e))
}
