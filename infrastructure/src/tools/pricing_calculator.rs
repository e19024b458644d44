//! Pricing calculator: quotes with volume and term discounts
//!
//! Base prices are annual and per user. The quote applies the volume
//! discount first, then the term discount on the remainder, then adds
//! per-user feature add-ons and the one-time deployment fee.

use super::simulated::{SimulatedTool, ToolDataError, string_list, string_param, usize_param};
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const PRICING_CALCULATOR: &str = "pricing_calculator";

const DEFAULT_USERS: usize = 1;
const DEFAULT_TERM_MONTHS: usize = 12;
const CURRENCY: &str = "USD";

#[derive(Debug, Clone, Deserialize)]
struct VolumeDiscount {
    min_users: usize,
    rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct PriceSheet {
    base_price: BTreeMap<String, f64>,
    volume_discounts: Vec<VolumeDiscount>,
    term_discounts: BTreeMap<String, f64>,
    #[serde(default)]
    additional_features: BTreeMap<String, f64>,
    #[serde(default)]
    on_premise_fee: f64,
}

impl PriceSheet {
    fn volume_rate(&self, users: usize) -> f64 {
        self.volume_discounts
            .iter()
            .filter(|d| users >= d.min_users)
            .map(|d| d.rate)
            .fold(0.0, f64::max)
    }

    fn cheapest_tier(&self) -> Option<&str> {
        self.base_price
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(tier, _)| tier.as_str())
    }
}

/// Get the tool definition for pricing_calculator
pub fn pricing_calculator_definition() -> ToolDefinition {
    ToolDefinition::new(
        PRICING_CALCULATOR,
        "Calculate a price quote for a product based on tier, user count, contract term and add-ons",
    )
    .with_parameter(
        ToolParameter::new("product_id", "Product identifier", true).with_type("string"),
    )
    .with_parameter(ToolParameter::new("tier", "Pricing tier", false).with_type("string"))
    .with_parameter(
        ToolParameter::new("users", "Number of users (default: 1)", false).with_type("integer"),
    )
    .with_parameter(
        ToolParameter::new("term_length", "Contract term in months (default: 12)", false)
            .with_type("integer"),
    )
    .with_parameter(
        ToolParameter::new("additional_features", "Optional add-on features", false)
            .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new("deployment", "Deployment type: 'cloud' or 'on_premise'", false)
            .with_type("string"),
    )
}

pub struct PricingCalculator {
    sheets: BTreeMap<String, PriceSheet>,
}

impl PricingCalculator {
    pub fn new() -> Result<Self, ToolDataError> {
        let sheets = serde_json::from_str(include_str!("data/pricing.json"))
            .map_err(|e| ToolDataError::new(PRICING_CALCULATOR, e))?;
        Ok(Self { sheets })
    }
}

impl SimulatedTool for PricingCalculator {
    fn definition(&self) -> ToolDefinition {
        pricing_calculator_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let product_id = string_param(parameters, "product_id")
            .ok_or_else(|| invalid("product_id must be a non-empty string"))?;
        let sheet = self.sheets.get(product_id).ok_or_else(|| {
            ToolError::execution_failed(format!("No pricing available for '{}'", product_id))
        })?;

        let tier = match string_param(parameters, "tier") {
            Some(t) => t,
            None => sheet
                .cheapest_tier()
                .ok_or_else(|| ToolError::execution_failed("Price sheet has no tiers"))?,
        };
        let base_price = *sheet.base_price.get(tier).ok_or_else(|| {
            let tiers: Vec<&str> = sheet.base_price.keys().map(String::as_str).collect();
            invalid(format!(
                "Invalid tier '{}'. Available tiers: {}",
                tier,
                tiers.join(", ")
            ))
        })?;

        let users = usize_param(parameters, "users", DEFAULT_USERS)?;
        if users == 0 {
            return Err(invalid("users must be at least 1"));
        }
        let term = usize_param(parameters, "term_length", DEFAULT_TERM_MONTHS)?;
        let term_rate = *sheet
            .term_discounts
            .get(&term.to_string())
            .ok_or_else(|| {
                let terms: Vec<&str> = sheet.term_discounts.keys().map(String::as_str).collect();
                invalid(format!(
                    "Unsupported term of {} months. Available terms: {}",
                    term,
                    terms.join(", ")
                ))
            })?;

        let mut add_ons = Vec::new();
        let mut add_on_total = 0.0;
        for feature in string_list(parameters, "additional_features") {
            let price = *sheet.additional_features.get(&feature).ok_or_else(|| {
                invalid(format!("Unknown add-on '{}' for {}", feature, product_id))
            })?;
            let total = price * users as f64;
            add_on_total += total;
            add_ons.push(json!({ "feature": feature, "price_per_user": price, "total": total }));
        }

        let on_premise = match string_param(parameters, "deployment").unwrap_or("cloud") {
            "cloud" => false,
            "on_premise" => true,
            other => return Err(invalid(format!("Unknown deployment type '{}'", other))),
        };
        let one_time = if on_premise { sheet.on_premise_fee } else { 0.0 };

        let volume_rate = sheet.volume_rate(users);
        let subtotal = base_price * users as f64;
        let volume_discount = subtotal * volume_rate;
        let term_discount = (subtotal - volume_discount) * term_rate;
        let annual = subtotal - volume_discount - term_discount + add_on_total;
        let contract = annual * term as f64 / 12.0 + one_time;

        Ok(json!({
            "product_id": product_id,
            "tier": tier,
            "users": users,
            "term_length_months": term,
            "deployment": if on_premise { "on_premise" } else { "cloud" },
            "breakdown": {
                "base_price_per_user": base_price,
                "subtotal": round_cents(subtotal),
                "volume_discount_rate": volume_rate,
                "volume_discount": round_cents(volume_discount),
                "term_discount_rate": term_rate,
                "term_discount": round_cents(term_discount),
                "additional_features": add_ons,
                "one_time_fee": one_time,
            },
            "total": {
                "monthly": round_cents(annual / 12.0),
                "annual": round_cents(annual),
                "contract": round_cents(contract),
            },
            "currency": CURRENCY,
        }))
    }
}

fn invalid(message: impl Into<String>) -> ToolError {
    ToolError::new(ToolErrorKind::InvalidParameters, message)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(params: Value) -> ToolOutcome {
        let Value::Object(map) = params else {
            unreachable!()
        };
        PricingCalculator::new().unwrap().execute(&map)
    }

    #[test]
    fn test_volume_and_term_discounts() {
        let result = quote(json!({
            "product_id": "data_analytics_enterprise",
            "tier": "enterprise",
            "users": 50,
            "term_length": 24
        }))
        .unwrap();
        // 1200 * 50 = 60000; -15% = 51000; -10% = 45900
        assert_eq!(result["breakdown"]["subtotal"], 60000.0);
        assert_eq!(result["breakdown"]["volume_discount"], 9000.0);
        assert_eq!(result["total"]["annual"], 45900.0);
        assert_eq!(result["total"]["monthly"], 3825.0);
        assert_eq!(result["total"]["contract"], 91800.0);
        assert_eq!(result["currency"], "USD");
    }

    #[test]
    fn test_defaults_pick_cheapest_tier() {
        let result = quote(json!({"product_id": "project_management_pro"})).unwrap();
        assert_eq!(result["tier"], "team");
        assert_eq!(result["users"], 1);
        assert_eq!(result["total"]["annual"], 240.0);
    }

    #[test]
    fn test_add_ons_and_on_premise_fee() {
        let result = quote(json!({
            "product_id": "data_analytics_enterprise",
            "tier": "standard",
            "users": 10,
            "additional_features": ["priority_support"],
            "deployment": "on_premise"
        }))
        .unwrap();
        // 8000 + 1000 add-on; contract adds the 5000 fee
        assert_eq!(result["total"]["annual"], 9000.0);
        assert_eq!(result["total"]["contract"], 14000.0);
    }

    #[test]
    fn test_invalid_tier_and_unknown_product() {
        let err = quote(json!({
            "product_id": "data_analytics_enterprise",
            "tier": "platinum"
        }))
        .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidParameters);
        assert!(err.message.contains("enterprise_plus"));

        let err = quote(json!({"product_id": "quantum_crm"})).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ExecutionFailed);
    }
}
