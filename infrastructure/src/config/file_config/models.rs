//! Models under evaluation from TOML (`[[models]]` array)

use serde::{Deserialize, Serialize};

/// How a configured model is reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileProviderKind {
    /// Any OpenAI-compatible chat-completions endpoint: OpenAI, Azure
    /// OpenAI's v1 surface, Mistral, or a local server such as Ollama
    #[default]
    #[serde(alias = "openai", alias = "azure", alias = "mistral", alias = "local")]
    OpenaiCompat,
    /// Offline replay of the scenarios' expected tool calls
    Scripted,
}

/// One model under evaluation
///
/// ```toml
/// [[models]]
/// id = "gpt-4o-mini"
/// base_url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
///
/// [[models]]
/// id = "local-llama"
/// model = "llama3.1:8b"
/// base_url = "http://localhost:11434/v1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Identifier used in reports
    pub id: String,
    pub provider: FileProviderKind,
    /// Model name sent on the wire (defaults to `id`)
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout_seconds: Option<u64>,
}

impl FileModelConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Wire model name
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.id)
    }
}
