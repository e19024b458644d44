//! Scenario subdomain: immutable multi-turn business conversation scripts
//! and the ground truth evaluators score against.

pub mod entities;

pub use entities::{
    Complexity, CustomerContext, ExpectedToolCall, GroundTruth, Scenario, Turn,
};
