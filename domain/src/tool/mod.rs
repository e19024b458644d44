//! Tool subdomain: definitions offered to the model, calls it issues, and
//! the structured outcomes fed back into the conversation.

pub mod entities;
pub mod value_objects;
