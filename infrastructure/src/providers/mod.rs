//! Model client adapters
//!
//! - [`OpenAiCompatClient`]: any OpenAI-compatible chat-completions endpoint
//! - [`ScriptedModelClient`]: offline replay for dry runs

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::{OpenAiCompatClient, OpenAiCompatSettings};
pub use scripted::ScriptedModelClient;
