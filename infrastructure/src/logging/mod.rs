//! Structured result output

mod jsonl_sink;

pub use jsonl_sink::JsonlResultSink;
