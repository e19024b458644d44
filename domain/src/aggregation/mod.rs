//! Aggregation subdomain: weighted overall scores, multi-run statistics,
//! success-rate policies and the final report.

pub mod report;
pub mod stats;
pub mod success;
pub mod weights;

pub use report::{AggregateReport, FailureSummary, ModelSummary, PairSummary, UnitTally};
pub use stats::{ScoreStats, ScoreSummary};
pub use success::SuccessRatePolicy;
pub use weights::{DimensionWeights, WEIGHT_TOLERANCE, WeightError};
