//! Output formatter trait

use bizeval_domain::AggregateReport;

/// Trait for rendering the aggregate report
pub trait ReportFormatter {
    fn format(&self, report: &AggregateReport) -> String;
}

/// Pretty-printed aggregate record
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &AggregateReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }
}
