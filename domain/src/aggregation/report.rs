//! Aggregate report over all units of one pipeline invocation

use crate::aggregation::stats::ScoreSummary;
use crate::aggregation::success::SuccessRatePolicy;
use crate::aggregation::weights::DimensionWeights;
use crate::core::model::ModelId;
use crate::evaluation::dimension::Dimension;
use crate::unit::{RunRecord, UnitFailure, UnitFailureKind, UnitId, UnitStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unit accounting. `dispatched = completed + failed + cancelled` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTally {
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
    /// Units left pending or running when the pipeline was cancelled
    pub cancelled: usize,
}

impl UnitTally {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a UnitStatus>) -> Self {
        statuses
            .into_iter()
            .fold(UnitTally::default(), |mut tally, status| {
                tally.dispatched += 1;
                match status {
                    UnitStatus::Completed => tally.completed += 1,
                    UnitStatus::Failed => tally.failed += 1,
                    UnitStatus::Pending | UnitStatus::Running => tally.cancelled += 1,
                }
                tally
            })
    }

    pub fn is_conserved(&self) -> bool {
        self.dispatched == self.completed + self.failed + self.cancelled
    }
}

/// Statistics for one (model, scenario) pair across its runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub model_id: ModelId,
    pub scenario_id: String,
    pub completed: usize,
    pub failed: usize,
    pub overall: ScoreSummary,
    pub dimensions: BTreeMap<Dimension, ScoreSummary>,
    pub success_rate: Option<f64>,
}

/// Statistics for one model across every scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_id: ModelId,
    pub scenarios: usize,
    pub completed: usize,
    pub failed: usize,
    pub overall: ScoreSummary,
    pub dimensions: BTreeMap<Dimension, ScoreSummary>,
    /// Derived from the run scores under the configured policy
    pub success_rate: Option<f64>,
}

/// Failure without the partial conversation, for the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub unit: UnitId,
    pub kind: UnitFailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<usize>,
    pub message: String,
}

impl From<&UnitFailure> for FailureSummary {
    fn from(failure: &UnitFailure) -> Self {
        Self {
            unit: failure.unit.clone(),
            kind: failure.kind,
            turn_index: failure.turn_index,
            message: failure.message.clone(),
        }
    }
}

/// The aggregate record emitted after the last unit is terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub models: Vec<ModelSummary>,
    pub scenarios: Vec<PairSummary>,
    pub tally: UnitTally,
    pub failures: Vec<FailureSummary>,
    pub weights: DimensionWeights,
    pub success_policy: SuccessRatePolicy,
}

impl AggregateReport {
    /// Build the report from the final status of every dispatched unit.
    ///
    /// Only completed runs contribute to statistics; a pair or model with
    /// none reports `NoData`.
    pub fn build(
        statuses: &BTreeMap<UnitId, UnitStatus>,
        records: &[RunRecord],
        failures: &[UnitFailure],
        weights: &DimensionWeights,
        policy: SuccessRatePolicy,
    ) -> Self {
        let dimensions: Vec<Dimension> = weights.dimensions().cloned().collect();

        let mut pairs: BTreeMap<(ModelId, String), Vec<&RunRecord>> = statuses
            .keys()
            .map(|u| ((u.model_id.clone(), u.scenario_id.clone()), Vec::new()))
            .collect();
        for record in records {
            pairs
                .entry((record.model_id.clone(), record.scenario_id.clone()))
                .or_default()
                .push(record);
        }

        let failed_in = |model: &ModelId, scenario: Option<&str>| {
            failures
                .iter()
                .filter(|f| {
                    &f.unit.model_id == model
                        && scenario.is_none_or(|s| f.unit.scenario_id == s)
                })
                .count()
        };

        let scenarios: Vec<PairSummary> = pairs
            .iter()
            .map(|((model_id, scenario_id), runs)| {
                let overall: Vec<f64> = runs.iter().map(|r| r.overall_score).collect();
                PairSummary {
                    model_id: model_id.clone(),
                    scenario_id: scenario_id.clone(),
                    completed: runs.len(),
                    failed: failed_in(model_id, Some(scenario_id)),
                    overall: ScoreSummary::from_values(&overall),
                    dimensions: dimension_summaries(&dimensions, runs),
                    success_rate: policy.rate(&overall),
                }
            })
            .collect();

        let model_ids: BTreeSet<&ModelId> = pairs.keys().map(|(m, _)| m).collect();
        let models = model_ids
            .into_iter()
            .map(|model_id| {
                let runs: Vec<&RunRecord> = pairs
                    .iter()
                    .filter(|((m, _), _)| m == model_id)
                    .flat_map(|(_, runs)| runs.iter().copied())
                    .collect();
                let overall: Vec<f64> = runs.iter().map(|r| r.overall_score).collect();
                ModelSummary {
                    model_id: model_id.clone(),
                    scenarios: pairs.keys().filter(|(m, _)| m == model_id).count(),
                    completed: runs.len(),
                    failed: failed_in(model_id, None),
                    overall: ScoreSummary::from_values(&overall),
                    dimensions: dimension_summaries(&dimensions, &runs),
                    success_rate: policy.rate(&overall),
                }
            })
            .collect();

        Self {
            models,
            scenarios,
            tally: UnitTally::from_statuses(statuses.values()),
            failures: failures.iter().map(FailureSummary::from).collect(),
            weights: weights.clone(),
            success_policy: policy,
        }
    }

    pub fn model(&self, model_id: &ModelId) -> Option<&ModelSummary> {
        self.models.iter().find(|m| &m.model_id == model_id)
    }

    pub fn pair(&self, model_id: &ModelId, scenario_id: &str) -> Option<&PairSummary> {
        self.scenarios
            .iter()
            .find(|p| &p.model_id == model_id && p.scenario_id == scenario_id)
    }
}

fn dimension_summaries(
    dimensions: &[Dimension],
    runs: &[&RunRecord],
) -> BTreeMap<Dimension, ScoreSummary> {
    dimensions
        .iter()
        .map(|dimension| {
            let values: Vec<f64> = runs
                .iter()
                .filter_map(|r| r.dimension_score(dimension))
                .collect();
            (dimension.clone(), ScoreSummary::from_values(&values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationState;
    use crate::evaluation::dimension::DimensionScore;

    fn record(model: &str, scenario: &str, run: usize, overall: f64) -> RunRecord {
        let scores = Dimension::BUILTIN
            .iter()
            .map(|d| DimensionScore::new(d.clone(), overall, vec![]))
            .collect();
        RunRecord::new(
            UnitId::new(ModelId::new(model), scenario, run),
            ConversationState::new(),
            scores,
            overall,
        )
    }

    #[test]
    fn test_failed_pair_reports_no_data() {
        let mut statuses = BTreeMap::new();
        let ok = UnitId::new(ModelId::new("m"), "s1", 0);
        let bad = UnitId::new(ModelId::new("m"), "s2", 0);
        statuses.insert(ok, UnitStatus::Completed);
        statuses.insert(bad.clone(), UnitStatus::Failed);

        let failure = UnitFailure::new(
            bad,
            UnitFailureKind::Timeout,
            "timed out",
            ConversationState::new(),
        );
        let report = AggregateReport::build(
            &statuses,
            &[record("m", "s1", 0, 0.8)],
            &[failure],
            &DimensionWeights::defaults(),
            SuccessRatePolicy::default(),
        );

        let s2 = report.pair(&ModelId::new("m"), "s2").unwrap();
        assert!(s2.overall.is_no_data());
        assert_eq!(s2.success_rate, None);
        assert_eq!(s2.failed, 1);
        assert!(s2.dimensions.values().all(ScoreSummary::is_no_data));

        let model = report.model(&ModelId::new("m")).unwrap();
        assert_eq!(model.completed, 1);
        assert_eq!(model.failed, 1);
        assert_eq!(model.scenarios, 2);
        assert_eq!(model.success_rate, Some(1.0));
        assert_eq!(report.tally.failed, 1);
        assert!(report.tally.is_conserved());
    }

    #[test]
    fn test_model_rollup_spans_scenarios() {
        let mut statuses = BTreeMap::new();
        let records = vec![
            record("a", "s1", 0, 0.6),
            record("a", "s2", 0, 0.8),
            record("b", "s1", 0, 0.4),
        ];
        for r in &records {
            statuses.insert(r.unit_id(), UnitStatus::Completed);
        }
        statuses.insert(UnitId::new(ModelId::new("b"), "s2", 0), UnitStatus::Pending);

        let report = AggregateReport::build(
            &statuses,
            &records,
            &[],
            &DimensionWeights::defaults(),
            SuccessRatePolicy::Threshold { threshold: 0.7 },
        );
        let a = report.model(&ModelId::new("a")).unwrap();
        assert!((a.overall.mean().unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(a.success_rate, Some(0.5));
        assert_eq!(
            a.dimensions[&Dimension::ToolUsage].stats().map(|s| s.count),
            Some(2)
        );
        assert_eq!(report.scenarios.len(), 4);
        assert_eq!(
            report.tally,
            UnitTally {
                dispatched: 4,
                completed: 3,
                failed: 0,
                cancelled: 1
            }
        );
    }
}
