//! Product catalog: lookup and filtering of product offerings

use super::simulated::{SimulatedTool, ToolDataError, string_list, string_param};
use bizeval_domain::{ToolDefinition, ToolError, ToolOutcome, ToolParameter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const PRODUCT_CATALOG: &str = "product_catalog";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Product {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub key_features: Vec<String>,
    pub industries: Vec<String>,
    pub tiers: Vec<String>,
}

impl Product {
    /// Number of requested features this product mentions
    fn feature_matches(&self, wanted: &[String]) -> usize {
        wanted
            .iter()
            .filter(|w| {
                let w = w.to_lowercase();
                self.key_features
                    .iter()
                    .any(|f| f.to_lowercase().contains(&w))
            })
            .count()
    }
}

/// Get the tool definition for product_catalog
pub fn product_catalog_definition() -> ToolDefinition {
    ToolDefinition::new(
        PRODUCT_CATALOG,
        "Retrieve information about products and services, including features, tiers and target industries",
    )
    .with_parameter(
        ToolParameter::new("product_id", "Specific product identifier", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "product_category",
            "Product category to search (e.g., 'data_analytics', 'project_management')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "industry",
            "Industry vertical (e.g., 'healthcare', 'retail')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("features", "Specific features to look for", false)
            .with_type("array"),
    )
}

pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new() -> Result<Self, ToolDataError> {
        let products = serde_json::from_str(include_str!("data/products.json"))
            .map_err(|e| ToolDataError::new(PRODUCT_CATALOG, e))?;
        Ok(Self { products })
    }
}

impl SimulatedTool for ProductCatalog {
    fn definition(&self) -> ToolDefinition {
        product_catalog_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        if let Some(id) = string_param(parameters, "product_id") {
            return self
                .products
                .iter()
                .find(|p| p.product_id == id)
                .map(|p| json!({ "product": p }))
                .ok_or_else(|| {
                    ToolError::execution_failed(format!("Product '{}' not found", id))
                });
        }

        let category = string_param(parameters, "product_category");
        let industry = string_param(parameters, "industry");
        let features = string_list(parameters, "features");

        let mut matches: Vec<(usize, &Product)> = self
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .filter(|p| industry.is_none_or(|i| p.industries.iter().any(|x| x == i)))
            .map(|p| (p.feature_matches(&features), p))
            .filter(|(hits, _)| features.is_empty() || *hits > 0)
            .collect();
        // Best feature coverage first; catalog order otherwise
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        let products: Vec<&Product> = matches.into_iter().map(|(_, p)| p).collect();
        if products.is_empty() {
            return Ok(json!({
                "products": [],
                "message": "No products match the given criteria",
            }));
        }
        Ok(json!({
            "products": products,
            "total": products.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(params: Value) -> ToolOutcome {
        let Value::Object(map) = params else {
            unreachable!()
        };
        ProductCatalog::new().unwrap().execute(&map)
    }

    #[test]
    fn test_lookup_by_id() {
        let result = lookup(json!({"product_id": "data_management_healthcare"})).unwrap();
        assert_eq!(result["product"]["name"], "HealthData Manager");
    }

    #[test]
    fn test_unknown_id_fails() {
        let err = lookup(json!({"product_id": "quantum_crm"})).unwrap_err();
        assert_eq!(err.kind, bizeval_domain::ToolErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_filter_by_industry_and_features() {
        let result = lookup(json!({
            "industry": "healthcare",
            "features": ["encryption", "audit logging"]
        }))
        .unwrap();
        assert_eq!(result["total"], 1);
        assert_eq!(
            result["products"][0]["product_id"],
            "data_management_healthcare"
        );
    }

    #[test]
    fn test_no_filters_lists_everything() {
        let result = lookup(json!({})).unwrap();
        assert_eq!(result["total"], 3);
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let result = lookup(json!({"product_category": "hardware"})).unwrap();
        assert!(result["products"].as_array().unwrap().is_empty());
    }
}
