//! One measurement run: read, measure, hand off, fall back.
//!
//! ```text
//! TextSource --read--> RawInput --MetricsAssembler--> ResultRecord
//!                                                        |
//!                               RunReport <-- RunInfo ---+
//!                                   |
//!                      ResultSink::write --Err--> text report on fallback writer
//! ```
//!
//! Everything that varies between runs is in `RunConfig`; there is no
//! global mode switch.

use std::io::Write;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::{CpuDeltaMode, MetricsAssembler};
use crate::report::{write_text, RunInfo, RunLabels, RunReport};
use crate::sampler::ResourceSampler;
use crate::sink::ResultSink;
use crate::source::TextSource;

/// Whether results are only displayed or also persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Display only
    #[default]
    Test,
    /// Store in the database, display on failure
    #[serde(alias = "db")]
    Persist,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Test => "test",
            RunMode::Persist => "persist",
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "test" => Ok(RunMode::Test),
            "persist" | "db" => Ok(RunMode::Persist),
            other => Err(format!(
                "unknown mode '{other}' (expected 'test' or 'db')"
            )),
        }
    }
}

/// Explicit configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub cpu_delta: CpuDeltaMode,
    pub labels: RunLabels,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Identifier generated by a storing sink
    pub stored_id: Option<i64>,
    /// True when the sink failed and the report went to the fallback writer
    pub fell_back: bool,
}

/// Measure the text behind `identifier` and deliver the report.
///
/// # Errors
/// - `Error::InputUnavailable` if the source cannot supply the text
/// - `Error::EmptyInput` if the text has no characters
/// - `Error::Io` if the sink failed and the fallback report could not be
///   written either
///
/// A sink failure alone is not an error: the report is written to
/// `fallback` instead and `RunOutcome::fell_back` is set.
pub fn execute(
    config: &RunConfig,
    identifier: &str,
    source: &dyn TextSource,
    sampler: &dyn ResourceSampler,
    sink: &mut dyn ResultSink,
    fallback: &mut dyn Write,
) -> Result<RunOutcome> {
    let input = source.read(identifier)?;
    if input.is_empty() {
        return Err(Error::EmptyInput {
            identifier: identifier.to_string(),
        });
    }
    tracing::info!(
        input = identifier,
        chars = input.char_count(),
        bytes = input.byte_len(),
        mode = config.mode.as_str(),
        "input read"
    );

    let (record, metadata) = MetricsAssembler::new(sampler, config.cpu_delta).run(input.text());
    tracing::info!(
        final_size = record.final_size,
        bits_per_char = metadata.bits_per_char,
        distinct_chars = metadata.n_distinct_chars,
        "compression done"
    );

    let report = RunReport {
        info: RunInfo::new(&input, &config.labels, Local::now()),
        record,
    };

    match sink.write(&report) {
        Ok(stored_id) => Ok(RunOutcome {
            report,
            stored_id,
            fell_back: false,
        }),
        Err(err) => {
            tracing::warn!(sink = sink.name(), error = %err, "sink failed, showing report instead");
            write_text(fallback, &report)?;
            Ok(RunOutcome {
                report,
                stored_id: None,
                fell_back: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::sampler::FixedSampler;
    use crate::sink::{ConsoleSink, FailingSink, ReportFormat};
    use crate::source::MemorySource;

    /// Remembers what it was given and hands out sequential ids.
    #[derive(Default)]
    struct RecordingSink {
        written: Vec<RunReport>,
    }

    impl ResultSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn write(&mut self, report: &RunReport) -> std::result::Result<Option<i64>, SinkError> {
            self.written.push(report.clone());
            Ok(Some(self.written.len() as i64))
        }
    }

    #[test]
    fn test_execute_stores_report() {
        let source = MemorySource::new("in.txt", "aabbbcc");
        let mut sink = RecordingSink::default();
        let mut fallback = Vec::new();

        let outcome = execute(
            &RunConfig::default(),
            "in.txt",
            &source,
            &FixedSampler::default(),
            &mut sink,
            &mut fallback,
        )
        .unwrap();

        assert_eq!(outcome.stored_id, Some(1));
        assert!(!outcome.fell_back);
        assert!(fallback.is_empty());
        assert_eq!(sink.written.len(), 1);
        assert_eq!(sink.written[0].record, outcome.report.record);
        assert_eq!(outcome.report.info.file_name, "in.txt");
    }

    #[test]
    fn test_execute_missing_input() {
        let source = MemorySource::new("in.txt", "abc");
        let mut sink = RecordingSink::default();

        let err = execute(
            &RunConfig::default(),
            "other.txt",
            &source,
            &FixedSampler::default(),
            &mut sink,
            &mut Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InputUnavailable { .. }));
        assert!(sink.written.is_empty());
    }

    #[test]
    fn test_execute_empty_input() {
        let source = MemorySource::new("empty.txt", "");
        let mut sink = RecordingSink::default();

        let err = execute(
            &RunConfig::default(),
            "empty.txt",
            &source,
            &FixedSampler::default(),
            &mut sink,
            &mut Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::EmptyInput { .. }));
        assert!(sink.written.is_empty());
    }

    #[test]
    fn test_sink_failure_falls_back_to_text() {
        let source = MemorySource::new("in.txt", "aabbbcc");
        let mut fallback = Vec::new();
        let config = RunConfig {
            mode: RunMode::Persist,
            ..Default::default()
        };

        let outcome = execute(
            &config,
            "in.txt",
            &source,
            &FixedSampler::default(),
            &mut FailingSink,
            &mut fallback,
        )
        .unwrap();

        assert!(outcome.fell_back);
        assert_eq!(outcome.stored_id, None);
        let shown = String::from_utf8(fallback).unwrap();
        assert!(shown.contains("7 bytes -> 2 bytes"));
    }

    #[test]
    fn test_console_sink_returns_no_id() {
        let source = MemorySource::new("in.txt", "zzzz");
        let mut sink = ConsoleSink::new(Vec::new(), ReportFormat::Text);

        let outcome = execute(
            &RunConfig::default(),
            "in.txt",
            &source,
            &FixedSampler::default(),
            &mut sink,
            &mut std::io::sink(),
        )
        .unwrap();

        assert_eq!(outcome.stored_id, None);
        assert!(!outcome.fell_back);
        assert_eq!(outcome.report.record.final_size, 1);
    }

    #[test]
    fn test_labels_flow_into_report() {
        let source = MemorySource::new("in.bin", "abc");
        let config = RunConfig {
            labels: RunLabels {
                algorithm: "bit_packing".to_string(),
                script_version: "v2".to_string(),
                origin: "lab".to_string(),
                comment: "rerun".to_string(),
            },
            ..Default::default()
        };
        let mut sink = RecordingSink::default();

        let outcome = execute(
            &config,
            "in.bin",
            &source,
            &FixedSampler::default(),
            &mut sink,
            &mut Vec::new(),
        )
        .unwrap();

        assert_eq!(outcome.report.info.labels.script_version, "v2");
        assert_eq!(outcome.report.info.file_kind.as_str(), "binary");
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("test".parse::<RunMode>(), Ok(RunMode::Test));
        assert_eq!("db".parse::<RunMode>(), Ok(RunMode::Persist));
        assert_eq!("persist".parse::<RunMode>(), Ok(RunMode::Persist));
        assert!("bd".parse::<RunMode>().is_err());
    }
}
