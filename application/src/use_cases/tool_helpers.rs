//! Shared helpers for tool use cases.

use bizeval_domain::ToolCall;
use bizeval_domain::core::string::truncate;

const PREVIEW_LEN: usize = 50;

/// Extract a short preview string from tool call arguments for log lines.
///
/// Looks for well-known keys (`query`, `product_id`, `meeting_type`,
/// `order_id`, ...) first, then falls back to the first string value found.
pub(crate) fn tool_args_preview(call: &ToolCall) -> String {
    let keys = [
        "query",
        "product_id",
        "meeting_type",
        "document_type",
        "order_id",
        "ticket_id",
        "customer_id",
        "check_organization",
    ];
    for key in &keys {
        if let Some(serde_json::Value::String(s)) = call.arguments.get(*key) {
            return truncate(s, PREVIEW_LEN);
        }
    }
    // Fallback: first string value
    for value in call.arguments.values() {
        if let Some(s) = value.as_str() {
            return truncate(s, PREVIEW_LEN);
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_preferred() {
        let call = ToolCall::new("c1", "knowledge_base")
            .with_arg("category", "pricing")
            .with_arg("query", "implementation timeline");
        assert_eq!(tool_args_preview(&call), "implementation timeline");
    }

    #[test]
    fn test_fallback_to_first_string() {
        let call = ToolCall::new("c1", "pricing_calculator")
            .with_arg("seats", 25)
            .with_arg("plan", "enterprise");
        assert_eq!(tool_args_preview(&call), "enterprise");
    }

    #[test]
    fn test_empty_arguments() {
        assert_eq!(tool_args_preview(&ToolCall::new("c1", "scheduler")), "");
    }

    #[test]
    fn test_long_value_truncated() {
        let call = ToolCall::new("c1", "knowledge_base").with_arg("query", "x".repeat(80));
        let preview = tool_args_preview(&call);
        assert_eq!(preview.len(), 50);
        assert!(preview.ends_with("..."));
    }
}
