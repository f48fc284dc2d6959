//! Final record assembly and the two output channels.
//!
//! The primary stream receives exactly one JSON document: the report or a
//! single-line error. Warnings go to the error stream.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::MonitorError;
use crate::health::HealthStatus;
use crate::metrics::MetricSnapshot;
use crate::normalize::ProfileRecord;

/// The single output artifact of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub metrics: MetricSnapshot,
    pub health_status: HealthStatus,
}

#[derive(Serialize)]
struct Envelope<'a> {
    data: &'a ReportRecord,
}

/// Render `{"data": record}` with four-space indentation.
pub fn render_report(record: &ReportRecord) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    Envelope { data: record }.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `{"<key>": "<message>"}` on one line.
fn message_line(key: &str, message: &str) -> String {
    let key = serde_json::Value::from(key);
    let message = serde_json::Value::from(message);
    format!("{{{key}: {message}}}")
}

pub fn error_line(message: &str) -> String {
    message_line("error", message)
}

pub fn warning_line(message: &str) -> String {
    message_line("warning", message)
}

/// Receives non-fatal diagnostics during a run.
pub trait WarningSink {
    fn warning(&mut self, message: &str);
}

/// Writes the run's outcome to a primary and an error stream.
#[derive(Debug)]
pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Write an already rendered report and its newline with one `write_all`.
    pub fn write_report(&mut self, rendered: &str) -> io::Result<()> {
        let mut document = String::with_capacity(rendered.len() + 1);
        document.push_str(rendered);
        document.push('\n');
        self.out.write_all(document.as_bytes())?;
        self.out.flush()
    }

    pub fn emit_error(&mut self, error: &MonitorError) {
        let line = error_line(&error.to_string());
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::error!(error = %e, "failed to write error line");
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> WarningSink for Reporter<O, E> {
    fn warning(&mut self, message: &str) {
        let line = warning_line(message);
        if let Err(e) = writeln!(self.err, "{line}").and_then(|_| self.err.flush()) {
            tracing::error!(error = %e, "failed to write warning line");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
