//! bitpack-bench-core: measure fixed-width bit packing over a text alphabet
//!
//! This library packs a UTF-8 text with the smallest fixed-width code that
//! covers its alphabet and records how well that worked:
//! - Compression ratio and gain
//! - Shannon entropy of the input and of the packed bytes
//! - Redundancy against the 8 bits/byte maximum
//! - Time, CPU and memory spent in the encode step
//!
//! # Architecture
//!
//! - `bitio`: MSB-first bit writer/reader
//! - `bitpack`: code table construction and packing
//! - `entropy`: Shannon entropy and redundancy
//! - `sampler`: process CPU/memory snapshots
//! - `metrics`: the measured encode step and the `ResultRecord`
//! - `source`: where input text comes from
//! - `report`: run description and text/JSON rendering
//! - `sink`: where finished reports go (console, or `store` with `sqlite`)
//! - `pipeline`: one complete run with sink fallback
//!
//! # Design Principles
//!
//! - **Deterministic**: the same text always gives the same codes and bytes
//! - **Explicit configuration**: run mode and CPU policy are values, not globals
//! - **Metrics are never lost**: a failing sink falls back to the text report
//! - **Faults are loud**: encoder invariant violations panic

pub mod bitio;
pub mod bitpack;
pub mod entropy;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod sampler;
pub mod sink;
pub mod source;
#[cfg(feature = "sqlite")]
pub mod store;

// Re-export commonly used types
pub use bitpack::{encode, CodeTable, EncodingMetadata};
pub use entropy::{redundancy, shannon_entropy, MAX_BYTE_ENTROPY};
pub use error::{Error, Result, SinkError};
pub use metrics::{CpuDeltaMode, MetricsAssembler, ResultRecord};
pub use pipeline::{execute, RunConfig, RunMode, RunOutcome};
pub use report::{RunInfo, RunLabels, RunReport};
pub use sampler::{ProcessSampler, ResourceSampler, ResourceSnapshot};
pub use sink::{select_sink, ConsoleSink, ReportFormat, ResultSink};
pub use source::{FileSource, MemorySource, RawInput, TextSource};
