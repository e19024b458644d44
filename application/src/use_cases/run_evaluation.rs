//! Run evaluation use case
//!
//! Schedules every (model, scenario, run) unit of work on a bounded pool,
//! scores completed conversations and builds the aggregate report.

use crate::config::{ConfigError, EvaluationConfig};
use crate::ports::model_client::ModelClient;
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::ports::result_sink::{NoResultSink, ResultSink};
use crate::ports::tool_backend::ToolBackend;
use crate::use_cases::dispatch_tool::{FailureInjector, ToolDispatcher};
use crate::use_cases::drive_conversation::{ConversationDriver, DriveError};
use bizeval_domain::{
    AggregateReport, ConversationState, DimensionWeights, EvaluationContext, EvaluatorRegistry,
    ModelId, RunRecord, Scenario, UnitFailure, UnitFailureKind, UnitId, UnitStatus,
};
use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a pipeline invocation produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Completed units, ordered by unit id
    pub records: Vec<RunRecord>,
    /// Failed units, ordered by unit id
    pub failures: Vec<UnitFailure>,
    pub report: AggregateReport,
    /// Whether cancellation cut the invocation short
    pub cancelled: bool,
}

enum UnitOutcome {
    Completed(Box<RunRecord>),
    Failed(Box<UnitFailure>),
    Cancelled,
}

/// Failure message for a unit whose task panicked; its history is lost
const PANICKED_MESSAGE: &str = "unit task panicked; partial state unavailable";

/// State shared by every unit task
struct UnitRunner {
    tools: Arc<dyn ToolBackend>,
    registry: EvaluatorRegistry,
    weights: DimensionWeights,
    injector: FailureInjector,
    driver: ConversationDriver,
    timeout: Duration,
}

impl UnitRunner {
    async fn run(
        &self,
        unit: UnitId,
        model: Arc<dyn ModelClient>,
        scenario: Arc<Scenario>,
        cancel: CancellationToken,
    ) -> UnitOutcome {
        let offered = self.tools.definitions().subset(scenario.offered_tool_ids());
        let mut dispatcher =
            ToolDispatcher::new(Arc::clone(&self.tools), offered, self.injector.for_unit(&unit));
        let mut state = match &scenario.system_prompt {
            Some(prompt) => ConversationState::with_system_prompt(prompt.clone()),
            None => ConversationState::new(),
        };

        let driven = tokio::select! {
            biased;
            _ = cancel.cancelled() => return UnitOutcome::Cancelled,
            result = tokio::time::timeout(
                self.timeout,
                self.driver.drive(&scenario, model.as_ref(), &mut dispatcher, &mut state),
            ) => result,
        };

        let failure = |kind, message: String, state| {
            UnitOutcome::Failed(Box::new(UnitFailure::new(unit.clone(), kind, message, state)))
        };
        match driven {
            Err(_) => {
                let message = format!("conversation exceeded its {:?} timeout", self.timeout);
                return failure(UnitFailureKind::Timeout, message, state);
            }
            Ok(Err(e @ DriveError::Model { .. })) => {
                return failure(UnitFailureKind::ModelError, e.to_string(), state);
            }
            Ok(Err(e @ DriveError::State(_))) => {
                return failure(UnitFailureKind::Internal, e.to_string(), state);
            }
            Ok(Ok(())) => {}
        }

        let ctx = EvaluationContext::new(&scenario, &state);
        let scores = self.registry.evaluate_all(&ctx);
        match self.weights.overall(&scores) {
            Ok(overall) => {
                UnitOutcome::Completed(Box::new(RunRecord::new(unit, state, scores, overall)))
            }
            Err(e) => failure(UnitFailureKind::Evaluation, e.to_string(), state),
        }
    }
}

/// The evaluation pipeline for one invocation.
///
/// Construction validates the whole configuration; a pipeline that exists
/// is ready to run and never fails as a whole.
pub struct EvaluationPipeline {
    models: Vec<Arc<dyn ModelClient>>,
    scenarios: Vec<Arc<Scenario>>,
    runner: Arc<UnitRunner>,
    config: EvaluationConfig,
}

impl EvaluationPipeline {
    pub fn new(
        models: Vec<Arc<dyn ModelClient>>,
        scenarios: Vec<Scenario>,
        tools: Arc<dyn ToolBackend>,
        registry: EvaluatorRegistry,
        config: EvaluationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        let mut model_ids = BTreeSet::new();
        if let Some(dup) = models.iter().find(|m| !model_ids.insert(m.id().clone())) {
            return Err(ConfigError::DuplicateModel(dup.id().clone()));
        }

        if scenarios.is_empty() {
            return Err(ConfigError::NoScenarios);
        }
        let mut scenario_ids = BTreeSet::new();
        for scenario in &scenarios {
            if !scenario_ids.insert(scenario.id.as_str()) {
                return Err(ConfigError::DuplicateScenario(scenario.id.clone()));
            }
            scenario
                .validate()
                .map_err(|e| ConfigError::Scenario(e.to_string()))?;
            if let Some(tool) = scenario
                .offered_tool_ids()
                .into_iter()
                .find(|t| !tools.has_tool(t))
            {
                return Err(ConfigError::UnknownTool {
                    tool: tool.to_string(),
                    source_name: format!("scenario '{}'", scenario.id),
                });
            }
        }

        if let Some(tool) = config.tool_error_rates.keys().find(|t| !tools.has_tool(t)) {
            return Err(ConfigError::UnknownTool {
                tool: tool.clone(),
                source_name: "tool error rates".to_string(),
            });
        }

        let registry = registry.with_weights(&config.weights)?;
        let weights = registry.weights();
        weights.validate()?;

        let runner = UnitRunner {
            tools,
            registry,
            weights,
            injector: FailureInjector::new(config.tool_error_rates.clone(), config.seed),
            driver: ConversationDriver::new(config.max_tool_calls_per_turn),
            timeout: config.unit_timeout,
        };

        Ok(Self {
            models,
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
            runner: Arc::new(runner),
            config,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Validated weights used for the overall score
    pub fn weights(&self) -> &DimensionWeights {
        &self.runner.weights
    }

    pub fn model_ids(&self) -> Vec<&ModelId> {
        self.models.iter().map(|m| m.id()).collect()
    }

    pub fn scenario_ids(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.id.as_str()).collect()
    }

    /// Size of the models × scenarios × runs cross-product
    pub fn total_units(&self) -> usize {
        self.models.len() * self.scenarios.len() * self.config.runs
    }

    /// Run with no progress output, no sink and no cancellation
    pub async fn execute(&self) -> PipelineOutput {
        self.run(&NoProgress, &NoResultSink, CancellationToken::new())
            .await
    }

    /// Run every unit and build the aggregate.
    ///
    /// At most `concurrency` units are in flight. Once `cancel` fires no
    /// new unit starts and in-flight units are dropped; completed results
    /// are kept and everything else is reported as cancelled.
    pub async fn run(
        &self,
        progress: &dyn PipelineProgress,
        sink: &dyn ResultSink,
        cancel: CancellationToken,
    ) -> PipelineOutput {
        let mut queue = self.units().into_iter();
        let mut statuses: BTreeMap<UnitId, UnitStatus> = BTreeMap::new();
        for (unit, _, _) in queue.as_slice() {
            statuses.insert(unit.clone(), UnitStatus::Pending);
        }

        info!(
            "Starting evaluation: {} units ({} models x {} scenarios x {} runs), concurrency {}",
            statuses.len(),
            self.models.len(),
            self.scenarios.len(),
            self.config.runs,
            self.config.concurrency
        );
        progress.on_pipeline_start(statuses.len());

        let mut join_set = JoinSet::new();
        let mut records = Vec::new();
        let mut failures = Vec::new();

        loop {
            while join_set.len() < self.config.concurrency && !cancel.is_cancelled() {
                let Some((unit, model, scenario)) = queue.next() else {
                    break;
                };
                advance(&mut statuses, &unit, UnitStatus::Running);
                progress.on_unit_start(&unit);
                debug!("Unit {} started", unit);

                let runner = Arc::clone(&self.runner);
                let cancel = cancel.clone();
                join_set.spawn(async move {
                    let outcome = AssertUnwindSafe(runner.run(unit.clone(), model, scenario, cancel))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            UnitOutcome::Failed(Box::new(UnitFailure::new(
                                unit.clone(),
                                UnitFailureKind::Internal,
                                PANICKED_MESSAGE,
                                ConversationState::new(),
                            )))
                        });
                    (unit, outcome)
                });
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok((unit, UnitOutcome::Completed(record))) => {
                    advance(&mut statuses, &unit, UnitStatus::Completed);
                    info!("Unit {} completed: overall {:.3}", unit, record.overall_score);
                    progress.on_unit_complete(&unit, record.overall_score);
                    sink.record_run(&record);
                    records.push(*record);
                }
                Ok((unit, UnitOutcome::Failed(failure))) => {
                    advance(&mut statuses, &unit, UnitStatus::Failed);
                    warn!("Unit {} failed ({}): {}", unit, failure.kind, failure.message);
                    progress.on_unit_failed(&unit, &failure);
                    sink.record_failure(&failure);
                    failures.push(*failure);
                }
                Ok((unit, UnitOutcome::Cancelled)) => {
                    debug!("Unit {} cancelled in flight", unit);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        let cancelled = cancel.is_cancelled();
        records.sort_by_key(RunRecord::unit_id);
        failures.sort_by(|a, b| a.unit.cmp(&b.unit));

        let report = AggregateReport::build(
            &statuses,
            &records,
            &failures,
            &self.runner.weights,
            self.config.success_rate,
        );
        info!(
            "Evaluation finished: {} completed, {} failed, {} cancelled",
            report.tally.completed, report.tally.failed, report.tally.cancelled
        );
        sink.record_aggregate(&report);
        progress.on_pipeline_complete(cancelled);

        PipelineOutput {
            records,
            failures,
            report,
            cancelled,
        }
    }

    fn units(&self) -> Vec<(UnitId, Arc<dyn ModelClient>, Arc<Scenario>)> {
        let mut units = Vec::with_capacity(self.total_units());
        for model in &self.models {
            for scenario in &self.scenarios {
                for run in 0..self.config.runs {
                    units.push((
                        UnitId::new(model.id().clone(), scenario.id.clone(), run),
                        Arc::clone(model),
                        Arc::clone(scenario),
                    ));
                }
            }
        }
        units
    }
}

fn advance(statuses: &mut BTreeMap<UnitId, UnitStatus>, unit: &UnitId, next: UnitStatus) {
    if let Some(status) = statuses.get_mut(unit) {
        match status.transition(next) {
            Ok(next) => *status = next,
            Err(e) => warn!("Unit {}: {}", unit, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_client::GatewayError;
    use crate::use_cases::test_support::{EchoTools, ExpectedToolsModel, ScriptedModel};
    use bizeval_domain::{
        Dimension, ExpectedToolCall, ScoreSummary, ToolErrorKind, Turn,
        WeightError,
    };
    use std::sync::Mutex;

    fn two_turn_scenario() -> Scenario {
        Scenario::new("demo-booking", "Demo booking")
            .with_tools(["knowledge_base", "scheduler"])
            .with_turn(
                Turn::new("How long does implementation take?")
                    .expect_tool(
                        ExpectedToolCall::new("knowledge_base")
                            .with_param("query", "implementation timeline"),
                    )
                    .expect_fact("implementation timeline: 6-8 weeks"),
            )
            .with_turn(
                Turn::new("Can we book a demo next week?")
                    .expect_tool(ExpectedToolCall::new("scheduler").with_param("meeting_type", "demo"))
                    .expect_fact("demo: Tuesday"),
            )
    }

    fn pipeline(models: Vec<Arc<dyn ModelClient>>, config: EvaluationConfig) -> EvaluationPipeline {
        EvaluationPipeline::new(
            models,
            vec![two_turn_scenario()],
            Arc::new(EchoTools::new()),
            EvaluatorRegistry::standard(),
            config,
        )
        .unwrap()
    }

    fn stub(id: &str) -> Arc<dyn ModelClient> {
        Arc::new(ExpectedToolsModel::new(id, two_turn_scenario()))
    }

    #[derive(Default)]
    struct RecordingSink {
        runs: Mutex<Vec<UnitId>>,
        failures: Mutex<Vec<UnitId>>,
        aggregates: Mutex<usize>,
    }

    impl ResultSink for RecordingSink {
        fn record_run(&self, record: &RunRecord) {
            self.runs.lock().unwrap().push(record.unit_id());
        }
        fn record_failure(&self, failure: &UnitFailure) {
            self.failures.lock().unwrap().push(failure.unit.clone());
        }
        fn record_aggregate(&self, _report: &AggregateReport) {
            *self.aggregates.lock().unwrap() += 1;
        }
    }

    #[tokio::test]
    async fn test_stub_model_scores_high_on_two_turn_scenario() {
        let output = pipeline(vec![stub("stub")], EvaluationConfig::default())
            .execute()
            .await;

        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert!(record.dimension_score(&Dimension::ToolUsage).unwrap() >= 0.9);
        assert!(record.dimension_score(&Dimension::ResponseQuality).unwrap() >= 0.7);
        assert!((0.0..=1.0).contains(&record.overall_score));
        assert_eq!(record.tool_invocations.len(), 2);
    }

    #[tokio::test]
    async fn test_identical_runs_have_zero_dispersion() {
        let config = EvaluationConfig::default().with_runs(5);
        let output = pipeline(vec![stub("stub")], config).execute().await;

        assert_eq!(output.records.len(), 5);
        let pair = output.report.pair(&ModelId::new("stub"), "demo-booking").unwrap();
        assert_eq!(pair.overall.stats().unwrap().std_dev, 0.0);
        assert_eq!(pair.completed, 5);
        assert!(output.report.tally.is_conserved());
    }

    #[tokio::test]
    async fn test_certain_tool_failure_is_scored_not_raised() {
        let config = EvaluationConfig::default()
            .with_runs(3)
            .with_error_rate("knowledge_base", 1.0);
        let output = pipeline(vec![stub("stub")], config).execute().await;

        assert!(output.failures.is_empty());
        assert_eq!(output.records.len(), 3);
        for record in &output.records {
            let kb: Vec<_> = record
                .tool_invocations
                .iter()
                .filter(|i| i.tool_id == "knowledge_base")
                .collect();
            assert!(!kb.is_empty());
            assert!(kb.iter().all(|i| i.error_kind().is_some_and(|k| ToolErrorKind::INJECTABLE.contains(&k))));
        }
    }

    #[tokio::test]
    async fn test_timeout_fails_unit_and_keeps_partial_state() {
        let slow: Arc<dyn ModelClient> = Arc::new(
            ScriptedModel::new("slow", vec![]).with_delay(Duration::from_secs(30)),
        );
        let config = EvaluationConfig::default().with_unit_timeout(Duration::from_millis(50));
        let sink = RecordingSink::default();
        let output = pipeline(vec![slow, stub("fast")], config)
            .run(&NoProgress, &sink, CancellationToken::new())
            .await;

        assert_eq!(output.failures.len(), 1);
        let failure = &output.failures[0];
        assert_eq!(failure.kind, UnitFailureKind::Timeout);
        assert!(failure.message.starts_with("conversation exceeded"));
        assert_eq!(failure.turn_index, Some(0));
        assert_eq!(failure.partial_state.history().len(), 1);

        let tally = output.report.tally;
        assert_eq!((tally.dispatched, tally.completed, tally.failed), (2, 1, 1));
        assert!(tally.is_conserved());
        let slow_pair = output.report.pair(&ModelId::new("slow"), "demo-booking").unwrap();
        assert!(slow_pair.overall.is_no_data());
        assert_eq!(sink.failures.lock().unwrap().len(), 1);
        assert_eq!(sink.runs.lock().unwrap().len(), 1);
        assert_eq!(*sink.aggregates.lock().unwrap(), 1);
    }

    struct PanickingModel(ModelId);

    #[async_trait::async_trait]
    impl ModelClient for PanickingModel {
        fn id(&self) -> &ModelId {
            &self.0
        }

        async fn generate(
            &self,
            _history: &[bizeval_domain::Message],
            _tools: &[bizeval_domain::ToolDefinition],
        ) -> Result<bizeval_domain::ModelResponse, GatewayError> {
            panic!("model exploded")
        }
    }

    #[tokio::test]
    async fn test_panicking_unit_fails_without_partial_state() {
        let panicking: Arc<dyn ModelClient> = Arc::new(PanickingModel(ModelId::new("boom")));
        let output = pipeline(vec![panicking, stub("fine")], EvaluationConfig::default())
            .execute()
            .await;

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.failures.len(), 1);
        let failure = &output.failures[0];
        assert_eq!(failure.kind, UnitFailureKind::Internal);
        assert!(failure.message.contains("partial state unavailable"));
        assert!(failure.partial_state.history().is_empty());
        assert!(output.report.tally.is_conserved());
    }

    #[tokio::test]
    async fn test_model_error_fails_unit() {
        let broken: Arc<dyn ModelClient> = Arc::new(ScriptedModel::new(
            "broken",
            vec![Err(GatewayError::ConnectionError("refused".into()))],
        ));
        let output = pipeline(vec![broken], EvaluationConfig::default()).execute().await;

        assert_eq!(output.failures[0].kind, UnitFailureKind::ModelError);
        assert!(output.records.is_empty());
        let model = output.report.model(&ModelId::new("broken")).unwrap();
        assert!(matches!(model.overall, ScoreSummary::NoData));
        assert_eq!(model.success_rate, None);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_units() {
        let slow: Arc<dyn ModelClient> = Arc::new(
            ScriptedModel::new("slow", vec![]).with_delay(Duration::from_secs(30)),
        );
        let config = EvaluationConfig::default()
            .with_concurrency(1)
            .with_runs(2);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let output = pipeline(vec![stub("fast"), slow], config)
            .run(&NoProgress, &NoResultSink, cancel)
            .await;

        assert!(output.cancelled);
        assert_eq!(output.records.len(), 2);
        assert!(output.failures.is_empty());
        let tally = output.report.tally;
        assert_eq!(tally.dispatched, 4);
        assert_eq!(tally.completed, 2);
        assert_eq!(tally.cancelled, 2);
        assert!(tally.is_conserved());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let output = pipeline(vec![stub("stub")], EvaluationConfig::default())
            .run(&NoProgress, &NoResultSink, cancel)
            .await;
        assert!(output.records.is_empty());
        assert_eq!(output.report.tally.cancelled, 1);
    }

    #[tokio::test]
    async fn test_pool_size_does_not_change_results() {
        let config = EvaluationConfig::default()
            .with_runs(4)
            .with_error_rate("knowledge_base", 0.5)
            .with_error_rate("scheduler", 0.5);
        let sequential = pipeline(vec![stub("a"), stub("b")], config.clone().with_concurrency(1))
            .execute()
            .await;
        let parallel = pipeline(vec![stub("a"), stub("b")], config.with_concurrency(8))
            .execute()
            .await;

        let scores = |o: &PipelineOutput| -> Vec<(UnitId, f64)> {
            o.records.iter().map(|r| (r.unit_id(), r.overall_score)).collect()
        };
        assert_eq!(scores(&sequential), scores(&parallel));
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let config = EvaluationConfig::default().with_weight(Dimension::Performance, 0.5);
        let err = EvaluationPipeline::new(
            vec![stub("stub")],
            vec![two_turn_scenario()],
            Arc::new(EchoTools::new()),
            EvaluatorRegistry::standard(),
            config,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Weights(WeightError::DoesNotSumToOne { .. })));
    }

    #[test]
    fn test_rejects_unknown_dimension_weight() {
        let config = EvaluationConfig::default().with_weight(Dimension::Custom("empathy".into()), 0.1);
        let err = EvaluationPipeline::new(
            vec![stub("stub")],
            vec![two_turn_scenario()],
            Arc::new(EchoTools::new()),
            EvaluatorRegistry::standard(),
            config,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Weights(WeightError::UnknownDimension(_))));
    }

    #[test]
    fn test_rejects_unknown_tools_and_empty_inputs() {
        let build = |models: Vec<Arc<dyn ModelClient>>, scenarios, config| {
            EvaluationPipeline::new(
                models,
                scenarios,
                Arc::new(EchoTools::new()),
                EvaluatorRegistry::standard(),
                config,
            )
            .err()
        };

        let rates = EvaluationConfig::default().with_error_rate("crm", 0.1);
        assert!(matches!(
            build(vec![stub("s")], vec![two_turn_scenario()], rates),
            Some(ConfigError::UnknownTool { .. })
        ));

        let foreign = two_turn_scenario().with_tools(["knowledge_base", "scheduler", "crm_lookup"]);
        assert!(matches!(
            build(vec![stub("s")], vec![foreign], EvaluationConfig::default()),
            Some(ConfigError::UnknownTool { .. })
        ));

        assert_eq!(
            build(vec![], vec![two_turn_scenario()], EvaluationConfig::default()),
            Some(ConfigError::NoModels)
        );
        assert_eq!(
            build(vec![stub("s")], vec![], EvaluationConfig::default()),
            Some(ConfigError::NoScenarios)
        );
        assert_eq!(
            build(vec![stub("s"), stub("s")], vec![two_turn_scenario()], EvaluationConfig::default()),
            Some(ConfigError::DuplicateModel(ModelId::new("s")))
        );
        assert_eq!(
            build(
                vec![stub("s")],
                vec![two_turn_scenario()],
                EvaluationConfig::default().with_runs(0)
            ),
            Some(ConfigError::InvalidRuns(0))
        );
    }

    #[test]
    fn test_weight_overrides_are_applied() {
        let config = EvaluationConfig::default()
            .with_weight(Dimension::ResponseQuality, 0.3)
            .with_weight(Dimension::Performance, 0.05);
        let p = pipeline(vec![stub("s")], config);
        assert_eq!(p.weights().get(&Dimension::ResponseQuality), Some(0.3));
        assert_eq!(p.weights().get(&Dimension::Performance), Some(0.05));
        assert_eq!(p.total_units(), 1);
    }

    #[tokio::test]
    async fn test_rescoring_is_deterministic() {
        let output = pipeline(vec![stub("s")], EvaluationConfig::default()).execute().await;
        let again = pipeline(vec![stub("s")], EvaluationConfig::default()).execute().await;
        assert_eq!(output.records[0].dimension_scores, again.records[0].dimension_scores);
    }
}
