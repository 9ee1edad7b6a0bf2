//! Destinations for finished run reports.
//!
//! A sink either stores the report and returns the generated identifier, or
//! displays it and returns `None`. Which sink a run uses is decided once, at
//! startup, by [`select_sink`].

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::pipeline::RunMode;
use crate::report::{render_json, write_text, RunReport};

/// Accepts a finished report.
pub trait ResultSink {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Store or display `report`. `Some(id)` is the identifier generated by
    /// a store.
    fn write(&mut self, report: &RunReport) -> Result<Option<i64>, SinkError>;
}

/// How the console sink renders a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Writes reports to any `Write` (usually stdout).
pub struct ConsoleSink<W: Write> {
    out: W,
    format: ReportFormat,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&mut self, report: &RunReport) -> Result<Option<i64>, SinkError> {
        let written = match self.format {
            ReportFormat::Text => write_text(&mut self.out, report),
            ReportFormat::Json => {
                let json = render_json(report)?;
                writeln!(self.out, "{json}")
            }
        };
        written
            .and_then(|()| self.out.flush())
            .map_err(|e| SinkError::Render(e.to_string()))?;
        Ok(None)
    }
}

/// Pick the sink for a run mode.
///
/// `Persist` opens the SQLite store when persistence support is compiled in;
/// otherwise it warns and displays to `console` instead. `Test` always
/// displays.
pub fn select_sink(
    mode: RunMode,
    database: &Path,
    console: Box<dyn Write>,
    format: ReportFormat,
) -> Box<dyn ResultSink> {
    match mode {
        RunMode::Test => Box::new(ConsoleSink::new(console, format)),
        RunMode::Persist => persistent_sink(database, console, format),
    }
}

#[cfg(feature = "sqlite")]
fn persistent_sink(
    database: &Path,
    _console: Box<dyn Write>,
    _format: ReportFormat,
) -> Box<dyn ResultSink> {
    Box::new(crate::store::SqliteSink::new(database))
}

#[cfg(not(feature = "sqlite"))]
fn persistent_sink(
    database: &Path,
    console: Box<dyn Write>,
    format: ReportFormat,
) -> Box<dyn ResultSink> {
    tracing::warn!(
        database = %database.display(),
        "persistence support not compiled in (enable the `sqlite` feature); running in test mode"
    );
    Box::new(ConsoleSink::new(console, format))
}

/// Sink that refuses every report. Stands in for an unreachable store in
/// tests.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl ResultSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn write(&mut self, _report: &RunReport) -> Result<Option<i64>, SinkError> {
        Err(SinkError::Disabled)
    }
}
