//! JSONL file writer for pipeline results.
//!
//! Each run, failure and the final aggregate is serialized as a single JSON
//! line with a `type` field (`run`, `failure`, `aggregate`) and a
//! `timestamp`, appended to the file via a buffered writer.

use bizeval_application::ResultSink;
use bizeval_domain::{AggregateReport, RunRecord, UnitFailure};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Result sink that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlResultSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlResultSink {
    /// Create a sink writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist,
    /// truncating an existing file.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record(&self, record_type: &str, payload: &impl Serialize) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match serde_json::to_value(payload) {
            Ok(Value::Object(mut map)) => {
                map.insert("type".to_string(), Value::String(record_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp));
                Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "type": record_type,
                "timestamp": timestamp,
                "data": other,
            }),
            Err(e) => {
                warn!("Could not serialize {} record: {}", record_type, e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}", line) {
                warn!("Could not write to {}: {}", self.path.display(), e);
                return;
            }
            // Append-only; flush each record so a crash keeps finished units
            let _ = writer.flush();
        }
    }
}

impl ResultSink for JsonlResultSink {
    fn record_run(&self, record: &RunRecord) {
        self.write_record("run", record);
    }

    fn record_failure(&self, failure: &UnitFailure) {
        self.write_record("failure", failure);
    }

    fn record_aggregate(&self, report: &AggregateReport) {
        self.write_record("aggregate", report);
    }
}

impl Drop for JsonlResultSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
