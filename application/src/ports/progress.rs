//! Progress notification port
//!
//! Defines the interface for reporting progress during a pipeline run.

use bizeval_domain::{UnitFailure, UnitId};

/// Callback for progress updates during a pipeline run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain log lines, etc.)
pub trait PipelineProgress: Send + Sync {
    /// Called once before any unit starts
    fn on_pipeline_start(&self, total_units: usize);

    /// Called when a unit acquires a worker slot
    fn on_unit_start(&self, _unit: &UnitId) {}

    /// Called when a unit completes with its overall score
    fn on_unit_complete(&self, unit: &UnitId, overall: f64);

    /// Called when a unit fails
    fn on_unit_failed(&self, unit: &UnitId, failure: &UnitFailure);

    /// Called after the last unit is terminal (or omitted on cancellation)
    fn on_pipeline_complete(&self, _cancelled: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_pipeline_start(&self, _total_units: usize) {}
    fn on_unit_complete(&self, _unit: &UnitId, _overall: f64) {}
    fn on_unit_failed(&self, _unit: &UnitId, _failure: &UnitFailure) {}
}
