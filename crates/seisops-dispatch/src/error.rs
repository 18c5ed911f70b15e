use std::path::PathBuf;

use thiserror::Error;

/// Errors raised inside a sub-run. None of them escape the worker that hit
/// them; the engine records them as `FailureReason::Unexpected`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The external program could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program exceeded the configured tool timeout.
    #[error("`{program}` timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Reading, creating or writing a durable marker failed.
    #[error("marker I/O on {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `dispatcher start + delay` does not fit the clock.
    #[error("delay {delay}s is beyond the scheduling horizon")]
    DeadlineOverflow { delay: u64 },

    /// The composite id cannot be used as a marker file name.
    #[error("invalid sub-run id `{0}`")]
    InvalidId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
