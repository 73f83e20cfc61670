//! Error types for the modsim engine.
//!
//! A trace line with fewer than five fields is the end-of-trace marker and never surfaces here.
//! Everything else that can go wrong in a run is reported through [`Error`].

use thiserror::Error;

/// Top-level error type for all operations in the engine.
///
/// Each variant corresponds to a specific failure domain:
/// - I/O: opening the trace, appending metrics or log lines
/// - Trace: a record that is present but cannot be used
/// - Config: invalid strategy name or run parameters
#[derive(Debug, Error)]
pub enum Error {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Trace record could not be parsed
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors for full-width trace records whose values are malformed.
#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    /// Window size or PDR value is not a number
    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// PDR value outside [0, 1]
    #[error("line {line}: pdr for {modulation} is {value}, outside [0, 1]")]
    PdrOutOfRange {
        line: usize,
        modulation: &'static str,
        value: f64,
    },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
