//! Result record assembly for one compression run.
//!
//! `MetricsAssembler::run` brackets the encode step with resource samples and
//! a monotonic timer, then derives every figure of the `ResultRecord`:
//! - Sizes, compression ratio and gain
//! - Entropy of the raw and packed bytes, absolute and relative variation
//! - Redundancy of both against 8 bits/byte
//! - Execution time, CPU and memory deltas
//! - Encoding shape (bits per char, padding, alphabet size)
//!
//! # Units
//!
//! Ratio is a unitless fraction, entropy is bits/byte, sizes are bytes,
//! time is milliseconds, CPU is a percentage-point delta, memory is bytes.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::bitpack::{self, EncodingMetadata};
use crate::entropy::{redundancy, shannon_entropy, MAX_BYTE_ENTROPY};
use crate::sampler::{ResourceDelta, ResourceSampler};

/// How the CPU figure is derived from the two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuDeltaMode {
    /// `Δuser_secs * 100`. Not a true utilization, but comparable with
    /// previously recorded runs.
    #[default]
    Literal,
    /// `(Δuser_secs + Δsystem_secs) / elapsed_secs * 100`.
    Normalized,
}

impl CpuDeltaMode {
    /// CPU figure for a measured interval.
    pub fn cpu_percent(self, delta: &ResourceDelta, elapsed: Duration) -> f64 {
        match self {
            CpuDeltaMode::Literal => delta.cpu_user_secs * 100.0,
            CpuDeltaMode::Normalized => {
                let secs = elapsed.as_secs_f64();
                if secs == 0.0 {
                    0.0
                } else {
                    (delta.cpu_user_secs + delta.cpu_system_secs) / secs * 100.0
                }
            }
        }
    }
}

impl std::str::FromStr for CpuDeltaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "literal" => Ok(CpuDeltaMode::Literal),
            "normalized" => Ok(CpuDeltaMode::Normalized),
            other => Err(format!(
                "unknown cpu delta mode '{other}' (expected 'literal' or 'normalized')"
            )),
        }
    }
}

/// Every metric of one run. Built once, then handed unchanged to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    // === Size ===
    /// UTF-8 byte length of the input
    pub original_size: u64,
    /// Packed byte length
    pub final_size: u64,
    /// `final_size / original_size`, 0 for empty input
    pub compression_ratio: f64,
    /// `1 - compression_ratio`
    pub compression_gain: f64,

    // === Entropy (bits/byte) ===
    pub initial_entropy: f64,
    pub final_entropy: f64,
    /// `final_entropy - initial_entropy`
    pub entropy_variation: f64,
    /// `entropy_variation / initial_entropy`, 0 when initial is 0
    pub relative_entropy_variation: f64,

    // === Redundancy (against 8 bits/byte) ===
    pub initial_redundancy: f64,
    pub final_redundancy: f64,

    // === Performance ===
    pub execution_time_ms: f64,
    /// Percentage points, see `CpuDeltaMode`
    pub cpu_usage_percent: f64,
    /// Resident memory delta, bytes
    pub memory_delta_bytes: i64,

    // === Encoding ===
    pub bits_per_char: u8,
    pub padding_bits: u8,
    pub distinct_chars: usize,

    /// Always false: fixed-width packing is lossless
    pub losses_detected: bool,
    /// Alias of `relative_entropy_variation`
    pub noise_level: f64,
}

/// Measurements taken around the encode step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Measurement {
    pub elapsed: Duration,
    pub resources: ResourceDelta,
}

/// Runs the encoder under measurement and builds the `ResultRecord`.
pub struct MetricsAssembler<'a, S: ResourceSampler + ?Sized> {
    sampler: &'a S,
    cpu_mode: CpuDeltaMode,
}

impl<'a, S: ResourceSampler + ?Sized> MetricsAssembler<'a, S> {
    pub fn new(sampler: &'a S, cpu_mode: CpuDeltaMode) -> Self {
        Self { sampler, cpu_mode }
    }

    /// Encode `text` and compute every metric.
    ///
    /// # Panics
    /// If the encoder output contradicts its own metadata. That is a defect
    /// in the encoder, not a runtime condition.
    pub fn run(&self, text: &str) -> (ResultRecord, EncodingMetadata) {
        let before = self.sampler.sample();
        let start = Instant::now();

        let (compressed, metadata) = bitpack::encode(text);

        let elapsed = start.elapsed();
        let after = self.sampler.sample();

        let char_count = text.chars().count();
        assert!(
            metadata.is_consistent(char_count, compressed.len()),
            "packed output of {} bytes does not match metadata {:?} for {} chars",
            compressed.len(),
            metadata,
            char_count,
        );

        let measurement = Measurement {
            elapsed,
            resources: before.delta(&after),
        };
        let record = assemble(text.as_bytes(), &compressed, &metadata, &measurement, self.cpu_mode);
        (record, metadata)
    }
}

/// Derive the record from raw bytes, packed bytes and measurements.
pub fn assemble(
    raw: &[u8],
    compressed: &[u8],
    metadata: &EncodingMetadata,
    measurement: &Measurement,
    cpu_mode: CpuDeltaMode,
) -> ResultRecord {
    let original_size = raw.len() as u64;
    let final_size = compressed.len() as u64;
    let compression_ratio = if original_size > 0 {
        final_size as f64 / original_size as f64
    } else {
        0.0
    };

    let initial_entropy = shannon_entropy(raw);
    let final_entropy = shannon_entropy(compressed);
    let entropy_variation = final_entropy - initial_entropy;
    let relative_entropy_variation = if initial_entropy > 0.0 {
        entropy_variation / initial_entropy
    } else {
        0.0
    };

    ResultRecord {
        original_size,
        final_size,
        compression_ratio,
        compression_gain: 1.0 - compression_ratio,
        initial_entropy,
        final_entropy,
        entropy_variation,
        relative_entropy_variation,
        initial_redundancy: redundancy(initial_entropy, MAX_BYTE_ENTROPY),
        final_redundancy: redundancy(final_entropy, MAX_BYTE_ENTROPY),
        execution_time_ms: measurement.elapsed.as_secs_f64() * 1000.0,
        cpu_usage_percent: cpu_mode.cpu_percent(&measurement.resources, measurement.elapsed),
        memory_delta_bytes: measurement.resources.rss_bytes,
        bits_per_char: metadata.bits_per_char,
        padding_bits: metadata.padding_bits,
        distinct_chars: metadata.n_distinct_chars,
        losses_detected: false,
        noise_level: relative_entropy_variation,
    }
}
