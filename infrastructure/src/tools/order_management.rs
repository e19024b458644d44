//! Order management: order lookup plus create, update and cancel
//!
//! Mutations never touch the backing data. One instance serves every
//! evaluation unit, so a created or modified order is returned to the
//! caller and then forgotten; ids are derived from the request so a
//! repeated call yields the same order.

use super::simulated::{
    DATE_FORMAT, SimulatedTool, ToolDataError, bool_param, load_anchored, string_param,
    usize_param,
};
use bizeval_domain::core::string::fnv1a64;
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const ORDER_MANAGEMENT: &str = "order_management";

const UPDATABLE_FIELDS: [&str; 4] = ["status", "payment_method", "payment_status", "notes"];
const DEFAULT_PAYMENT_METHOD: &str = "Invoice NET-30";

/// Unit price by product code fragment, first match wins
const UNIT_PRICES: [(&str, f64); 9] = [
    ("ENT", 350.0),
    ("PRE", 400.0),
    ("API", 1500.0),
    ("DAM", 700.0),
    ("CIM", 700.0),
    ("INT", 12000.0),
    ("POS", 150.0),
    ("SUP", 20000.0),
    ("TRN", 500.0),
];
const DEFAULT_UNIT_PRICE: f64 = 1000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Order {
    order_id: String,
    customer_id: String,
    company_name: String,
    order_date: String,
    status: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl Order {
    fn is_closed(&self) -> bool {
        matches!(self.status.as_str(), "Delivered" | "Cancelled")
    }
}

/// Get the tool definition for order_management
pub fn order_management_definition() -> ToolDefinition {
    ToolDefinition::new(
        ORDER_MANAGEMENT,
        "Check order status, create new orders, modify existing orders, and cancel orders",
    )
    .with_parameter(ToolParameter::new("order_id", "Order ID to look up", false).with_type("string"))
    .with_parameter(
        ToolParameter::new("customer_id", "Customer ID to look up orders for", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("company_name", "Company name to look up orders for", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "time_period",
            "Time period to retrieve orders for ('30d', '90d', '6m', '1y', 'all')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "status",
            "Filter orders by status, or the new status when updating",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("create_order", "Whether to create a new order", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("update_order", "Whether to update an existing order", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("cancel_order", "Whether to cancel an existing order", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("product_id", "Product ID for a new order", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("product_name", "Product name for a new order", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("license_count", "License count for a new order (default: 1)", false)
            .with_type("integer"),
    )
    .with_parameter(
        ToolParameter::new("billing_address", "Billing address for a new order", false)
            .with_type("object"),
    )
    .with_parameter(
        ToolParameter::new("payment_method", "Payment method", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("payment_status", "New payment status when updating", false)
            .with_type("string"),
    )
    .with_parameter(ToolParameter::new("notes", "Order notes", false).with_type("string"))
    .with_parameter(
        ToolParameter::new(
            "cancellation_reason",
            "Reason recorded when cancelling",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "urgency",
            "Urgency level for a new order ('standard', 'expedited', 'rush')",
            false,
        )
        .with_type("string"),
    )
}

fn unit_price(product_id: &str) -> f64 {
    UNIT_PRICES
        .iter()
        .find(|(code, _)| product_id.contains(code))
        .map_or(DEFAULT_UNIT_PRICE, |(_, price)| *price)
}

fn delivery_days(urgency: &str) -> i64 {
    match urgency {
        "rush" => 1,
        "expedited" => 3,
        _ => 5,
    }
}

fn missing(name: &str) -> ToolError {
    ToolError::new(
        ToolErrorKind::InvalidParameters,
        format!("Missing required parameter: {}", name),
    )
}

pub struct OrderManagement {
    orders: Vec<Order>,
    today: NaiveDate,
}

impl OrderManagement {
    pub fn new(today: NaiveDate) -> Result<Self, ToolDataError> {
        let orders = load_anchored(ORDER_MANAGEMENT, include_str!("data/orders.json"), today)?;
        Ok(Self { orders, today })
    }

    fn date(&self, offset_days: i64) -> Value {
        self.today
            .checked_add_signed(TimeDelta::days(offset_days))
            .map_or(Value::Null, |d| json!(d.format(DATE_FORMAT).to_string()))
    }

    fn get(&self, order_id: &str) -> Result<&Order, ToolError> {
        self.orders
            .iter()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| ToolError::execution_failed(format!("Order {} not found", order_id)))
    }

    /// An open order that an update or cancel may modify
    fn open_order(&self, parameters: &Map<String, Value>, action: &str) -> Result<Order, ToolError> {
        let order_id = string_param(parameters, "order_id").ok_or_else(|| missing("order_id"))?;
        let order = self.get(order_id)?;
        if order.is_closed() {
            return Err(ToolError::execution_failed(format!(
                "Cannot {} order {} because it is already {}",
                action, order.order_id, order.status
            )));
        }
        Ok(order.clone())
    }

    fn list(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let customer_id = string_param(parameters, "customer_id");
        let company = string_param(parameters, "company_name");
        let owns = |o: &Order| match (customer_id, company) {
            (Some(id), _) => o.customer_id == id,
            (None, Some(name)) => o.company_name.eq_ignore_ascii_case(name),
            (None, None) => true,
        };

        let since = match string_param(parameters, "time_period")
            .unwrap_or("all")
            .to_lowercase()
            .as_str()
        {
            "all" => None,
            "30d" => Some(30),
            "90d" => Some(90),
            "6m" => Some(180),
            "1y" => Some(365),
            other => {
                return Err(ToolError::new(
                    ToolErrorKind::InvalidParameters,
                    format!(
                        "Unknown time_period '{}'; expected one of 30d, 90d, 6m, 1y, all",
                        other
                    ),
                ));
            }
        }
        .and_then(|days| self.date(-days).as_str().map(str::to_string));
        let status = string_param(parameters, "status");

        let owned: Vec<&Order> = self
            .orders
            .iter()
            .filter(|&o| owns(o))
            .collect();
        if let Some(key) = customer_id.or(company)
            && owned.is_empty()
        {
            return Err(ToolError::execution_failed(format!(
                "No orders found for {}",
                key
            )));
        }

        let mut orders: Vec<&Order> = owned
            .into_iter()
            .filter(|o| since.as_deref().is_none_or(|s| o.order_date.as_str() >= s))
            .filter(|o| status.is_none_or(|s| o.status.eq_ignore_ascii_case(s)))
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));

        Ok(json!({
            "order_count": orders.len(),
            "orders": orders,
        }))
    }

    fn create(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let customer_id =
            string_param(parameters, "customer_id").ok_or_else(|| missing("customer_id"))?;
        let product_id =
            string_param(parameters, "product_id").ok_or_else(|| missing("product_id"))?;
        let product_name =
            string_param(parameters, "product_name").ok_or_else(|| missing("product_name"))?;
        let license_count = usize_param(parameters, "license_count", 1)?;
        let urgency = string_param(parameters, "urgency")
            .unwrap_or("standard")
            .to_lowercase();

        let company_name = self
            .orders
            .iter()
            .find(|o| o.customer_id == customer_id)
            .map_or("Unknown Company", |o| o.company_name.as_str());
        let key = format!("{}|{}|{}|{}", customer_id, product_id, license_count, urgency);
        let order_id = format!("ORD-{}", 80_000 + fnv1a64(key.as_bytes()) % 20_000);
        let price = unit_price(product_id);
        let total = price * license_count as f64;

        let order = json!({
            "order_id": order_id,
            "customer_id": customer_id,
            "company_name": company_name,
            "order_date": self.date(0),
            "status": "Pending",
            "products": [{
                "product_id": product_id,
                "product_name": product_name,
                "license_count": license_count,
                "unit_price": price,
                "total_price": total,
            }],
            "subtotal": total,
            "tax": 0.0,
            "shipping": 0.0,
            "total": total,
            "payment_method": string_param(parameters, "payment_method").unwrap_or(DEFAULT_PAYMENT_METHOD),
            "payment_status": "Pending",
            "payment_date": Value::Null,
            "billing_address": parameters.get("billing_address").cloned().unwrap_or(Value::Null),
            "notes": string_param(parameters, "notes").unwrap_or_default(),
            "delivery_method": "Electronic",
            "expected_delivery_date": self.date(delivery_days(&urgency)),
            "actual_delivery_date": Value::Null,
        });
        Ok(json!({
            "message": format!("Order {} created successfully", order_id),
            "order": order,
        }))
    }

    fn update(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let mut order = self.open_order(parameters, "update")?;
        for field in UPDATABLE_FIELDS {
            let Some(value) = string_param(parameters, field) else {
                continue;
            };
            if field == "status" {
                order.status = value.to_string();
            } else {
                order.details.insert(field.to_string(), json!(value));
            }
        }
        if string_param(parameters, "payment_status") == Some("Paid") {
            order.details.insert("payment_date".into(), self.date(0));
        }
        if order.status == "Delivered" {
            order.details.insert("actual_delivery_date".into(), self.date(0));
        }
        Ok(json!({
            "message": format!("Order {} updated successfully", order.order_id),
            "order": order,
        }))
    }

    fn cancel(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let mut order = self.open_order(parameters, "cancel")?;
        let reason =
            string_param(parameters, "cancellation_reason").unwrap_or("Cancelled by customer");
        let notes = order
            .details
            .get("notes")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let notes = if notes.is_empty() {
            reason.to_string()
        } else {
            format!("{} - {}", notes, reason)
        };
        order.status = "Cancelled".into();
        order.details.insert("notes".into(), json!(notes));
        Ok(json!({
            "message": format!("Order {} cancelled successfully", order.order_id),
            "order": order,
        }))
    }
}

impl SimulatedTool for OrderManagement {
    fn definition(&self) -> ToolDefinition {
        order_management_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        if bool_param(parameters, "create_order") {
            return self.create(parameters);
        }
        if bool_param(parameters, "update_order") {
            return self.update(parameters);
        }
        if bool_param(parameters, "cancel_order") {
            return self.cancel(parameters);
        }
        match string_param(parameters, "order_id") {
            Some(order_id) => Ok(json!({ "order": self.get(order_id)? })),
            None => self.list(parameters),
        }
    }
}
