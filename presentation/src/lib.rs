//! Presentation layer for bizeval
//!
//! This crate contains CLI definitions, report formatters and progress
//! reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::disable_color;
pub use output::formatter::{JsonFormatter, ReportFormatter};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
