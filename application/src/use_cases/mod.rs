//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_tool;
pub mod drive_conversation;
pub mod run_evaluation;
pub(crate) mod tool_helpers;

#[cfg(test)]
pub(crate) mod test_support;
