//! Error types for the bitpack-bench pipeline.
//!
//! Recoverable conditions (missing input, empty input, sink failures) are
//! structured errors. Invariant violations inside the encoder are programming
//! faults and panic instead of being reported here.

use thiserror::Error;

/// Top-level error type for a measurement run.
///
/// Each variant corresponds to a specific failure domain:
/// - Input: the text could not be read, or was empty
/// - Sink: the result record could not be stored
/// - Config: invalid run configuration
/// - I/O: writing the report failed
#[derive(Debug, Error)]
pub enum Error {
    /// Source text is missing, unreadable or not valid UTF-8
    #[error("input '{identifier}' unavailable: {source}")]
    InputUnavailable {
        identifier: String,
        #[source]
        source: std::io::Error,
    },

    /// Source text was read but contains no characters
    #[error("input '{identifier}' is empty")]
    EmptyInput { identifier: String },

    /// Result sink failed
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Bit I/O misuse (e.g. a field wider than 64 bits)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Report output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read more bits than available
    #[error("insufficient bits: requested {requested}, available {available}")]
    InsufficientBits { requested: usize, available: usize },

    /// Invalid bit count (more than 64 bits in one field)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Failures of a result sink. Never fatal for a run: the pipeline falls
/// back to the console report.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink refuses every report
    #[error("sink is disabled")]
    Disabled,

    /// Could not open the store
    #[error("cannot open store {location}: {message}")]
    Open { location: String, message: String },

    /// Schema migration failed
    #[error("migration to version {version} failed: {message}")]
    Migration { version: u32, message: String },

    /// Insert or commit failed
    #[error("insert into {table} failed: {message}")]
    Insert { table: &'static str, message: String },

    /// Rendering the record failed
    #[error("cannot render record: {0}")]
    Render(String),
}

impl Error {
    /// Short machine-friendly category, used in log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Error::InputUnavailable { .. } => "input_unavailable",
            Error::EmptyInput { .. } => "empty_input",
            Error::Sink(_) => "sink_failure",
            Error::BitIo(_) => "bit_io",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
