//! Port for structured result records.
//!
//! Defines the [`ResultSink`] trait the pipeline hands every run record,
//! failure and the final aggregate to. Downstream reporting consumes these
//! records verbatim; the pipeline never renders output formats itself.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures results in
//! a machine-readable format (e.g. JSONL).

use bizeval_domain::{AggregateReport, RunRecord, UnitFailure};

/// Port for recording pipeline results.
///
/// The methods are synchronous and non-fallible so that a broken sink
/// never fails a unit; implementations log and drop write errors.
pub trait ResultSink: Send + Sync {
    /// Record a completed unit.
    fn record_run(&self, record: &RunRecord);

    /// Record a failed unit with its partial conversation.
    fn record_failure(&self, failure: &UnitFailure);

    /// Record the aggregate, emitted once after all units are terminal.
    fn record_aggregate(&self, report: &AggregateReport);
}

/// No-op implementation for tests and when no output is requested.
pub struct NoResultSink;

impl ResultSink for NoResultSink {
    fn record_run(&self, _record: &RunRecord) {}
    fn record_failure(&self, _failure: &UnitFailure) {}
    fn record_aggregate(&self, _report: &AggregateReport) {}
}
