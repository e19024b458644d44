//! JSON Schema tool converter.
//!
//! Produces the OpenAI-style `function` tool schema offered to models over
//! the chat-completions API.

use bizeval_domain::ToolDefinition;
use serde_json::{Map, Value, json};

/// Map a parameter type hint onto a JSON Schema type
///
/// - `"string"`, `"number"`, `"integer"`, `"boolean"`, `"object"` → unchanged
/// - `"array"` → array of strings
/// - anything else → `"string"`
fn parameter_schema(param_type: &str, description: &str) -> Value {
    match param_type {
        "array" => json!({
            "type": "array",
            "items": { "type": "string" },
            "description": description,
        }),
        "number" | "integer" | "boolean" | "object" => json!({
            "type": param_type,
            "description": description,
        }),
        _ => json!({
            "type": "string",
            "description": description,
        }),
    }
}

/// Convert a tool definition into a chat-completions `tools` entry
pub fn tool_to_function_schema(tool: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &tool.parameters {
        properties.insert(
            param.name.clone(),
            parameter_schema(&param.param_type, &param.description),
        );
        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

/// Convert the offered tools, preserving their order
pub fn tools_to_function_schemas(tools: &[ToolDefinition]) -> Vec<Value> {
    tools.iter().map(tool_to_function_schema).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizeval_domain::ToolParameter;

    #[test]
    fn test_tool_to_function_schema() {
        let tool = ToolDefinition::new("knowledge_base", "Search articles")
            .with_parameter(ToolParameter::new("query", "Search query", true))
            .with_parameter(
                ToolParameter::new("max_results", "Result limit", false).with_type("integer"),
            )
            .with_parameter(
                ToolParameter::new("categories", "Categories", false).with_type("array"),
            );

        let schema = tool_to_function_schema(&tool);

        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "knowledge_base");
        let params = &schema["function"]["parameters"];
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["query"]["type"], "string");
        assert_eq!(params["properties"]["max_results"]["type"], "integer");
        assert_eq!(params["properties"]["categories"]["items"]["type"], "string");

        let required = params["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "query");
    }

    #[test]
    fn test_unknown_type_maps_to_string() {
        let tool = ToolDefinition::new("t", "d")
            .with_parameter(ToolParameter::new("when", "Date", false).with_type("date"));
        let schema = tool_to_function_schema(&tool);
        assert_eq!(
            schema["function"]["parameters"]["properties"]["when"]["type"],
            "string"
        );
    }
}
