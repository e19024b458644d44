//! Progress reporting for pipeline execution

use bizeval_application::PipelineProgress;
use bizeval_domain::{UnitFailure, UnitId};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with a single bar over all units
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn unit_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for ProgressReporter {
    fn on_pipeline_start(&self, total_units: usize) {
        let bar = ProgressBar::new(total_units as u64);
        bar.set_style(Self::unit_style());
        bar.set_prefix("Evaluating");
        bar.set_message("Starting...");
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_unit_start(&self, unit: &UnitId) {
        self.with_bar(|bar| bar.set_message(unit.to_string()));
    }

    fn on_unit_complete(&self, unit: &UnitId, overall: f64) {
        self.with_bar(|bar| {
            bar.set_message(format!("{} {} {:.3}", "v".green(), unit, overall));
            bar.inc(1);
        });
    }

    fn on_unit_failed(&self, unit: &UnitId, failure: &UnitFailure) {
        self.with_bar(|bar| {
            bar.println(format!("{} {} ({})", "x".red(), unit, failure.kind));
            bar.inc(1);
        });
    }

    fn on_pipeline_complete(&self, cancelled: bool) {
        if let Ok(mut guard) = self.bar.lock()
            && let Some(bar) = guard.take()
        {
            if cancelled {
                bar.abandon_with_message(format!("{}", "cancelled".yellow()));
            } else {
                bar.finish_with_message(format!("{}", "complete!".green()));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgress for SimpleProgress {
    fn on_pipeline_start(&self, total_units: usize) {
        eprintln!(
            "{} {} ({} units)",
            "->".cyan(),
            "Evaluating".bold(),
            total_units
        );
    }

    fn on_unit_complete(&self, unit: &UnitId, overall: f64) {
        eprintln!("  {} {} {:.3}", "v".green(), unit, overall);
    }

    fn on_unit_failed(&self, unit: &UnitId, failure: &UnitFailure) {
        eprintln!(
            "  {} {} ({}: {})",
            "x".red(),
            unit,
            failure.kind,
            failure.message
        );
    }

    fn on_pipeline_complete(&self, cancelled: bool) {
        if cancelled {
            eprintln!("{} {}", "!".yellow(), "Cancelled; partial results follow".yellow());
        }
        eprintln!();
    }
}
