//! Run description, the report handed to sinks, and its renderings.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::metrics::ResultRecord;
use crate::source::RawInput;

/// Descriptive labels attached to every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLabels {
    pub algorithm: String,
    pub script_version: String,
    pub origin: String,
    pub comment: String,
}

impl Default for RunLabels {
    fn default() -> Self {
        Self {
            algorithm: "bit_packing".to_string(),
            script_version: "v1".to_string(),
            origin: "local".to_string(),
            comment: "Structural compression test with bit packing".to_string(),
        }
    }
}

/// Coarse file category, derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Image,
    Audio,
    Binary,
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => FileKind::Text,
            Some("png" | "jpg") => FileKind::Image,
            Some("wav") => FileKind::Audio,
            Some("bin") => FileKind::Binary,
            _ => FileKind::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Binary => "binary",
            FileKind::Other => "other",
        }
    }
}

/// What was measured, when, and under which labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub file_name: String,
    pub file_kind: FileKind,
    #[serde(flatten)]
    pub labels: RunLabels,
    pub executed_at: DateTime<Local>,
    pub char_count: usize,
    /// CRC-32 of the input bytes, to tell inputs with the same name apart
    pub input_crc32: u32,
}

impl RunInfo {
    pub fn new(input: &RawInput, labels: &RunLabels, executed_at: DateTime<Local>) -> Self {
        Self {
            file_name: input.identifier().to_string(),
            file_kind: FileKind::from_name(input.identifier()),
            labels: labels.clone(),
            executed_at,
            char_count: input.char_count(),
            input_crc32: crc32fast::hash(input.as_bytes()),
        }
    }
}

/// One finished run: the unit written to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub info: RunInfo,
    pub record: ResultRecord,
}

const RULE: &str = "======================================================================";

/// Write the human-readable multi-section report.
pub fn write_text<W: Write + ?Sized>(out: &mut W, report: &RunReport) -> io::Result<()> {
    let info = &report.info;
    let r = &report.record;

    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "TEST: {} | {}",
        info.labels.algorithm.to_uppercase(),
        info.file_name
    )?;
    writeln!(out, "{RULE}")?;

    writeln!(out, "\nCompression:")?;
    writeln!(out, "  {} bytes -> {} bytes", r.original_size, r.final_size)?;
    writeln!(
        out,
        "  Ratio: {:.4} | Gain: {:.2}%",
        r.compression_ratio,
        r.compression_gain * 100.0
    )?;
    writeln!(
        out,
        "  Encoding: {} bits/char, {} distinct chars, {} padding bits",
        r.bits_per_char, r.distinct_chars, r.padding_bits
    )?;

    writeln!(out, "\nEntropy:")?;
    writeln!(out, "  Initial: {:.4} bits/byte", r.initial_entropy)?;
    writeln!(out, "  Final: {:.4} bits/byte", r.final_entropy)?;
    writeln!(
        out,
        "  Variation: {:+.4} ({:+.2}%)",
        r.entropy_variation,
        r.relative_entropy_variation * 100.0
    )?;

    writeln!(out, "\nRedundancy:")?;
    writeln!(out, "  Initial: {:.4}", r.initial_redundancy)?;
    writeln!(out, "  Final: {:.4}", r.final_redundancy)?;

    writeln!(out, "\nPerformance:")?;
    writeln!(out, "  Time: {:.2} ms", r.execution_time_ms)?;
    writeln!(out, "  CPU: {:.2}%", r.cpu_usage_percent)?;
    writeln!(out, "  Memory: {} bytes", r.memory_delta_bytes)?;

    writeln!(out, "\n{RULE}\n")?;
    Ok(())
}

/// Pretty JSON of the whole report.
pub fn render_json(report: &RunReport) -> Result<String, SinkError> {
    serde_json::to_string_pretty(report).map_err(|e| SinkError::Render(e.to_string()))
}
