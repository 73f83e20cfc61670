//! Error type for the modsim binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Simulation engine error
    #[error(transparent)]
    Core(#[from] modsim_core::Error),

    /// File I/O error outside a simulation run
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sweep parameters file could not be parsed
    #[error("invalid parameters file: {0}")]
    Json(#[from] serde_json::Error),

    /// Some runs of a sweep did not complete
    #[error("{failed} of {runs} sweep runs failed")]
    SweepFailed { failed: usize, runs: usize },
}
