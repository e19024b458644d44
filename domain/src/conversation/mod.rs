//! Conversation subdomain: the message history and per-turn bookkeeping
//! a single (model, scenario, run) execution accumulates.

pub mod entities;
pub mod response;

pub use entities::{ConversationState, Message, Role, TurnEnd, TurnRecord};
pub use response::{ModelResponse, ResponseMetrics, TokenUsage};
