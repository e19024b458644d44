//! Tool dispatch with seedable failure injection.
//!
//! Every unit of work gets its own [`ToolDispatcher`] whose random stream is
//! derived from the pipeline seed and the unit's identity, so injected
//! failures do not depend on scheduling order or pool size.

use crate::ports::tool_backend::ToolBackend;
use crate::use_cases::tool_helpers::tool_args_preview;
use bizeval_domain::core::string::fnv1a64;
use bizeval_domain::{
    ToolCall, ToolDefinition, ToolError, ToolErrorKind, ToolInvocation, UnitId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Per-tool failure probabilities plus the base seed
#[derive(Debug, Clone, Default)]
pub struct FailureInjector {
    rates: Arc<BTreeMap<String, f64>>,
    seed: u64,
}

impl FailureInjector {
    pub fn new(rates: BTreeMap<String, f64>, seed: u64) -> Self {
        Self {
            rates: Arc::new(rates),
            seed,
        }
    }

    /// Injector that never fails a call
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn rate(&self, tool_id: &str) -> f64 {
        self.rates.get(tool_id).copied().unwrap_or(0.0)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive the random stream for one unit
    pub fn for_unit(&self, unit: &UnitId) -> UnitInjector {
        let seed = self.seed ^ fnv1a64(unit.to_string().as_bytes());
        UnitInjector {
            rates: Arc::clone(&self.rates),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Failure stream owned by a single unit
#[derive(Debug, Clone)]
pub struct UnitInjector {
    rates: Arc<BTreeMap<String, f64>>,
    rng: StdRng,
}

impl UnitInjector {
    /// Roll for `tool_id`; returns the injected error, if any
    ///
    /// Tools without a configured rate consume no randomness.
    pub fn draw(&mut self, tool_id: &str) -> Option<ToolError> {
        let rate = self.rates.get(tool_id).copied().unwrap_or(0.0);
        if rate <= 0.0 {
            return None;
        }
        let roll: f64 = self.rng.r#gen();
        if roll >= rate {
            return None;
        }
        let kinds = ToolErrorKind::INJECTABLE;
        let kind = kinds[self.rng.gen_range(0..kinds.len())];
        Some(ToolError::of_kind(kind, tool_id))
    }
}

/// Executes one unit's tool calls against the backend.
///
/// Order of checks: the tool must be offered to the scenario
/// (`ToolNotFound`), required parameters must be present
/// (`InvalidParameters`), then the injector rolls, and only then is the
/// backend called.
pub struct ToolDispatcher {
    backend: Arc<dyn ToolBackend>,
    offered: Vec<ToolDefinition>,
    injector: UnitInjector,
}

impl ToolDispatcher {
    pub fn new(
        backend: Arc<dyn ToolBackend>,
        offered: Vec<ToolDefinition>,
        injector: UnitInjector,
    ) -> Self {
        Self {
            backend,
            offered,
            injector,
        }
    }

    /// Tool definitions sent to the model with every request
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.offered
    }

    pub async fn dispatch(&mut self, call: &ToolCall, turn_index: usize) -> ToolInvocation {
        let started = Instant::now();
        debug!(
            "Dispatching {} ({}) in turn {}",
            call.tool_id,
            tool_args_preview(call),
            turn_index
        );

        let outcome = match self.offered.iter().find(|d| d.name == call.tool_id) {
            None => Err(ToolError::not_found(&call.tool_id)),
            Some(definition) => {
                let missing = definition.missing_parameters(&call.arguments);
                if !missing.is_empty() {
                    Err(ToolError::invalid_parameters(&call.tool_id, &missing))
                } else if let Some(injected) = self.injector.draw(&call.tool_id) {
                    debug!("Injected {} for {}", injected.kind, call.tool_id);
                    Err(injected)
                } else {
                    self.backend.execute(&call.tool_id, &call.arguments).await
                }
            }
        };

        ToolInvocation {
            call_id: call.id.clone(),
            tool_id: call.tool_id.clone(),
            parameters: call.arguments.clone(),
            outcome,
            latency: started.elapsed(),
            turn_index,
        }
    }
}
