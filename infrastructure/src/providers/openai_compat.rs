//! OpenAI-compatible chat-completions client
//!
//! Works against any endpoint speaking the `/chat/completions` wire format
//! (OpenAI, vLLM, Ollama, LM Studio, ...). The full conversation history and
//! the offered tool definitions are sent on every request; latency is
//! measured around the HTTP round trip.

use crate::tools::tools_to_function_schemas;
use async_trait::async_trait;
use bizeval_application::{GatewayError, ModelClient};
use bizeval_domain::{
    Message, ModelId, ModelResponse, Role, TokenUsage, ToolCall, ToolDefinition,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.0;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Connection settings for one model endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatSettings {
    /// Identifier used in reports
    pub id: ModelId,
    /// Model name sent on the wire
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// HTTP request timeout (the pipeline's unit timeout still applies)
    pub request_timeout: Duration,
}

impl OpenAiCompatSettings {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: ModelId::new(id),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

pub struct OpenAiCompatClient {
    settings: OpenAiCompatSettings,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(settings: OpenAiCompatSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, history: &[Message], tools: &[ToolDefinition]) -> ChatRequest {
        let has_tools = !tools.is_empty();
        ChatRequest {
            model: self.settings.model.clone(),
            messages: history.iter().map(WireMessage::from_message).collect(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            tools: has_tools.then(|| tools_to_function_schemas(tools)),
            tool_choice: has_tools.then(|| "auto".to_string()),
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    fn id(&self) -> &ModelId {
        &self.settings.id
    }

    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError> {
        let body = self.request_body(history, tools);
        let started = Instant::now();

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        let latency = started.elapsed();

        debug!(
            "{} responded {} in {}ms",
            self.settings.id,
            status,
            latency.as_millis()
        );

        if status.as_u16() == 404 {
            return Err(GatewayError::ModelNotAvailable(format!(
                "{} ({})",
                self.settings.model, status
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!("{}: {}", status, text)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(format!("parse failed: {}", e)))?;
        parsed.into_model_response(latency)
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn from_message(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: Some(message.content.clone()),
            tool_calls: message
                .tool_calls
                .iter()
                .map(WireToolCall::from_call)
                .collect(),
            tool_call_id: match message.role {
                Role::Tool => message.tool_call_id.clone(),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    type_: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

impl WireToolCall {
    fn from_call(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            type_: function_type(),
            function: WireFunctionCall {
                name: call.tool_id.clone(),
                arguments: Value::Object(call.arguments.clone()).to_string(),
            },
        }
    }

    fn into_call(self) -> ToolCall {
        let raw = self.function.arguments.trim();
        let arguments = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ if raw.is_empty() => Map::new(),
            _ => {
                // Left empty so the dispatcher reports the missing parameters
                warn!(
                    "Malformed arguments for tool call {} ({}): {}",
                    self.id, self.function.name, raw
                );
                Map::new()
            }
        };
        ToolCall {
            id: self.id,
            tool_id: self.function.name,
            arguments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_model_response(self, latency: Duration) -> Result<ModelResponse, GatewayError> {
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        let message = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| GatewayError::InvalidResponse("missing choices[0].message".into()))?;

        let content = message.content.unwrap_or_default();
        let calls: Vec<ToolCall> = message
            .tool_calls
            .into_iter()
            .map(WireToolCall::into_call)
            .collect();
        Ok(ModelResponse::with_tool_calls(content, calls)
            .with_latency(latency)
            .with_usage(usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizeval_domain::ToolParameter;

    fn client() -> OpenAiCompatClient {
        OpenAiCompatClient::new(
            OpenAiCompatSettings::new("gpt-test", "gpt-4o-mini")
                .with_base_url("http://localhost:8000/v1/"),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_carries_history_and_tools() {
        let call = ToolCall::new("call_1", "knowledge_base").with_arg("query", "refund");
        let history = vec![
            Message::system("Be helpful"),
            Message::user("What is the refund policy?"),
            Message::assistant_with_calls("", vec![call]),
            Message::tool_result("call_1", "knowledge_base", r#"{"results":[]}"#),
        ];
        let tools = vec![
            ToolDefinition::new("knowledge_base", "Search")
                .with_parameter(ToolParameter::new("query", "Query", true)),
        ];

        let body = serde_json::to_value(client().request_body(&history, &tools)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["messages"][2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            body["messages"][2]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"refund"}"#
        );
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
        assert_eq!(body["tools"][0]["function"]["name"], "knowledge_base");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_request_body_without_tools_omits_tool_fields() {
        let body = serde_json::to_value(client().request_body(&[Message::user("hi")], &[])).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "scheduler", "arguments": "{\"meeting_type\":\"product_demo\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        let response = parsed
            .into_model_response(Duration::from_millis(250))
            .unwrap();

        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].tool_id, "scheduler");
        assert_eq!(
            response.tool_calls[0].get_string("meeting_type"),
            Some("product_demo")
        );
        assert_eq!(response.usage.total(), 150);
        assert_eq!(response.latency, Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_arguments_become_empty() {
        let call = WireToolCall {
            id: "c".into(),
            type_: function_type(),
            function: WireFunctionCall {
                name: "scheduler".into(),
                arguments: "{not json".into(),
            },
        }
        .into_call();
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_missing_choices_is_invalid() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = parsed.into_model_response(Duration::ZERO).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
