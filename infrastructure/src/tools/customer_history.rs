//! Customer history: account profile plus purchase, support, billing and usage records
//!
//! Record dates are stored relative to "today" and anchored when the tool
//! is built, so time-period filters behave the same on any run date.

use super::simulated::{DATE_FORMAT, SimulatedTool, ToolDataError, load_anchored, string_param};
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const CUSTOMER_HISTORY: &str = "customer_history";

const HISTORY_TYPES: [&str; 5] = ["purchases", "support", "billing", "usage", "all"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Contact {
    name: String,
    email: String,
    phone: String,
    role: String,
}

/// One dated record; the remaining fields pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryEntry {
    date: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct Customer {
    customer_id: String,
    company_name: String,
    industry: String,
    tier: String,
    contract_start: String,
    contract_end: String,
    primary_contact: Contact,
    billing_contact: Contact,
    account_manager: String,
    customer_success_manager: String,
    purchase_history: Vec<HistoryEntry>,
    support_history: Vec<HistoryEntry>,
    billing_history: Vec<HistoryEntry>,
    usage_metrics: Value,
}

impl Customer {
    fn matches_email(&self, email: &str) -> bool {
        self.primary_contact.email.eq_ignore_ascii_case(email)
            || self.billing_contact.email.eq_ignore_ascii_case(email)
    }
}

/// Get the tool definition for customer_history
pub fn customer_history_definition() -> ToolDefinition {
    ToolDefinition::new(
        CUSTOMER_HISTORY,
        "Retrieve customer account information and history including purchases, support tickets, billing and usage",
    )
    .with_parameter(
        ToolParameter::new("customer_id", "Unique customer identifier (e.g., 'CUS-10001')", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("company_name", "Customer company name", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("email", "Primary or billing contact email", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "history_type",
            "Type of history to retrieve ('purchases', 'support', 'billing', 'usage', 'all')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "time_period",
            "Time period to cover ('3m', '6m', '1y', '2y', 'all')",
            false,
        )
        .with_type("string"),
    )
}

/// Earliest date a `time_period` includes; `None` keeps everything.
fn period_start(period: &str, today: NaiveDate) -> Result<Option<String>, ToolError> {
    let days = match period {
        "all" => return Ok(None),
        "3m" => 90,
        "6m" => 180,
        "1y" => 365,
        "2y" => 730,
        other => {
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                format!(
                    "Unknown time_period '{}'; expected one of 3m, 6m, 1y, 2y, all",
                    other
                ),
            ));
        }
    };
    Ok(today
        .checked_sub_signed(TimeDelta::days(days))
        .map(|d| d.format(DATE_FORMAT).to_string()))
}

fn within<'a>(entries: &'a [HistoryEntry], since: Option<&str>) -> Vec<&'a HistoryEntry> {
    // ISO dates compare correctly as strings
    entries
        .iter()
        .filter(|e| since.is_none_or(|s| e.date.as_str() >= s))
        .collect()
}

pub struct CustomerHistory {
    customers: BTreeMap<String, Customer>,
    today: NaiveDate,
}

impl CustomerHistory {
    pub fn new(today: NaiveDate) -> Result<Self, ToolDataError> {
        let customers = load_anchored(
            CUSTOMER_HISTORY,
            include_str!("data/customers.json"),
            today,
        )?;
        Ok(Self { customers, today })
    }

    fn find(&self, parameters: &Map<String, Value>) -> Result<&Customer, ToolError> {
        let customer_id = string_param(parameters, "customer_id");
        let company = string_param(parameters, "company_name");
        let email = string_param(parameters, "email");
        if customer_id.is_none() && company.is_none() && email.is_none() {
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                "Provide customer_id, company_name or email",
            ));
        }

        let found = match customer_id {
            Some(id) => self.customers.get(id),
            None => self.customers.values().find(|c| {
                company.is_some_and(|n| c.company_name.eq_ignore_ascii_case(n))
                    || email.is_some_and(|e| c.matches_email(e))
            }),
        };
        found.ok_or_else(|| {
            let key = customer_id.or(company).or(email).unwrap_or_default();
            ToolError::execution_failed(format!("Customer not found: {}", key))
        })
    }
}

impl SimulatedTool for CustomerHistory {
    fn definition(&self) -> ToolDefinition {
        customer_history_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let history_type = string_param(parameters, "history_type")
            .unwrap_or("all")
            .to_lowercase();
        if !HISTORY_TYPES.contains(&history_type.as_str()) {
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                format!(
                    "Unknown history_type '{}'; expected one of {}",
                    history_type,
                    HISTORY_TYPES.join(", ")
                ),
            ));
        }
        let since = period_start(
            &string_param(parameters, "time_period")
                .unwrap_or("all")
                .to_lowercase(),
            self.today,
        )?;
        let customer = self.find(parameters)?;

        let mut response = json!({
            "customer_id": customer.customer_id,
            "company_name": customer.company_name,
            "industry": customer.industry,
            "tier": customer.tier,
            "contract_start": customer.contract_start,
            "contract_end": customer.contract_end,
            "primary_contact": customer.primary_contact,
            "account_manager": customer.account_manager,
            "customer_success_manager": customer.customer_success_manager,
        });
        let wants = |section: &str| history_type == "all" || history_type == section;
        let since = since.as_deref();
        if wants("purchases") {
            response["purchase_history"] = json!(within(&customer.purchase_history, since));
        }
        if wants("support") {
            response["support_history"] = json!(within(&customer.support_history, since));
        }
        if wants("billing") {
            response["billing_contact"] = json!(customer.billing_contact);
            response["billing_history"] = json!(within(&customer.billing_history, since));
        }
        if wants("usage") {
            response["usage_metrics"] = customer.usage_metrics.clone();
        }
        Ok(response)
    }
}
