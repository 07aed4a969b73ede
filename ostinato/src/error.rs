//! Error types for the ostinato aggregation pipeline.

use thiserror::Error;

/// The main error type for all ostinato operations.
///
/// The pipeline itself has no fatal error path: malformed measurements are
/// repaired in place, NaN observations are skipped per snapshot, and registry
/// encoding failures degrade the exposition output rather than halting it.
/// The variants here cover the few conditions callers can actually observe.
#[derive(Error, Debug)]
pub enum OstinatoError {
    /// No measurement with the given identity is held in any live generation.
    #[error("no measurement found for identity '{identity}'")]
    NotFound {
        /// The identity that was looked up.
        identity: String,
    },

    /// The ingestion channel has been closed by `shutdown`.
    #[error("ingestion pipe is closed")]
    PipeClosed,

    /// An internal instrument could not be registered at construction.
    #[error("telemetry registration failed: {0}")]
    Telemetry(#[from] prometheus::Error),
}

/// Type alias for `Result<T, OstinatoError>`.
pub type Result<T> = std::result::Result<T, OstinatoError>;
