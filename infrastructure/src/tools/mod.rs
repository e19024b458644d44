//! Simulated business tools
//!
//! Each tool module exposes its name, a `*_definition()` function and a
//! [`SimulatedTool`] implementation over embedded JSON data:
//!
//! - `knowledge_base`: keyword search over FAQ and support articles
//! - `product_catalog`: product lookup and filtering
//! - `pricing_calculator`: quotes with volume and term discounts
//! - `scheduler`: deterministic availability and booking
//! - `document_retrieval`: section search over technical, legal and compliance docs
//! - `customer_history`: account profile with purchase, support and billing records
//! - `order_management`: order lookup plus non-persisting create/update/cancel
//! - `support_ticket`: ticket lookup, incident checks and ticket creation
//!
//! [`SimulatedTools`] bundles them behind the application layer's
//! `ToolBackend` port.

pub mod customer_history;
pub mod document_retrieval;
pub mod knowledge_base;
pub mod order_management;
pub mod pricing_calculator;
pub mod product_catalog;
pub mod scheduler;
pub mod schema;
pub mod support_ticket;

mod simulated;

pub use schema::{tool_to_function_schema, tools_to_function_schemas};
pub use simulated::{SimulatedTool, SimulatedTools, ToolDataError};

use bizeval_domain::ToolSpec;

/// Definitions of every simulated tool, without loading their data
pub fn standard_tool_spec() -> ToolSpec {
    ToolSpec::new()
        .register(knowledge_base::knowledge_base_definition())
        .register(product_catalog::product_catalog_definition())
        .register(pricing_calculator::pricing_calculator_definition())
        .register(scheduler::scheduler_definition())
        .register(document_retrieval::document_retrieval_definition())
        .register(customer_history::customer_history_definition())
        .register(order_management::order_management_definition())
        .register(support_ticket::support_ticket_definition())
}
