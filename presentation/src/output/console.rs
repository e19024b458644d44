//! Console output formatter for evaluation reports

use crate::output::formatter::ReportFormatter;
use bizeval_domain::{AggregateReport, Dimension, ScoreSummary};
use colored::Colorize;
use std::collections::BTreeMap;

/// Formats the aggregate report for console display
pub struct ConsoleFormatter;

impl ReportFormatter for ConsoleFormatter {
    fn format(&self, report: &AggregateReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Business Evaluation Report"));
        output.push('\n');

        let tally = report.tally;
        output.push_str(&format!(
            "{} {} dispatched, {} completed, {} failed, {} cancelled\n",
            "Units:".cyan().bold(),
            tally.dispatched,
            tally.completed.to_string().green(),
            if tally.failed > 0 {
                tally.failed.to_string().red()
            } else {
                tally.failed.to_string().normal()
            },
            tally.cancelled
        ));

        output.push_str(&Self::section_header("Models"));
        for model in &report.models {
            output.push_str(&format!(
                "\n{}  overall {}  success {}  ({} runs, {} failed, {} scenarios)\n",
                model.model_id.to_string().yellow().bold(),
                Self::summary(&model.overall),
                Self::rate(model.success_rate),
                model.completed,
                model.failed,
                model.scenarios
            ));
            output.push_str(&Self::dimensions(&model.dimensions));
        }

        output.push_str(&Self::section_header("Scenarios"));
        for pair in &report.scenarios {
            output.push_str(&format!(
                "  {:<40} {}  ({} runs, {} failed)\n",
                format!("{} / {}", pair.model_id, pair.scenario_id),
                Self::summary(&pair.overall),
                pair.completed,
                pair.failed
            ));
        }

        if !report.failures.is_empty() {
            output.push_str(&Self::section_header("Failures"));
            for failure in &report.failures {
                let turn = failure
                    .turn_index
                    .map(|t| format!(" turn {}", t + 1))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "  {} {} [{}]{}: {}\n",
                    "x".red(),
                    failure.unit,
                    failure.kind,
                    turn,
                    failure.message
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }
}

impl ConsoleFormatter {
    fn summary(summary: &ScoreSummary) -> String {
        match summary.stats() {
            Some(stats) if stats.count > 1 => format!(
                "{} ± {:.3} (n={})",
                Self::score(stats.mean),
                stats.std_dev,
                stats.count
            ),
            Some(stats) => Self::score(stats.mean),
            None => "no data".dimmed().to_string(),
        }
    }

    fn score(value: f64) -> String {
        let text = format!("{:.3}", value);
        if value >= 0.8 {
            text.green().to_string()
        } else if value >= 0.6 {
            text.yellow().to_string()
        } else {
            text.red().to_string()
        }
    }

    fn rate(rate: Option<f64>) -> String {
        rate.map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string())
    }

    fn dimensions(dimensions: &BTreeMap<Dimension, ScoreSummary>) -> String {
        dimensions
            .iter()
            .map(|(dimension, summary)| {
                format!(
                    "    {:<22} {}\n",
                    dimension.display_name(),
                    Self::summary(summary)
                )
            })
            .collect()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
