//! Error types for the radar binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup. Once ingestion and the server are
//! running, failures are logged rather than propagated.

use liveradar_core::config::ConfigError;
use liveradar_core::maps::MapError;
use liveradar_observer::StartupError;

/// Top-level error for the radar binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The placeholder background could not be generated.
    #[error("map error: {source}")]
    Map {
        /// The underlying map error.
        #[from]
        source: MapError,
    },

    /// The HTTP server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: StartupError,
    },

    /// Reading answers from the terminal failed.
    #[error("prompt error: {source}")]
    Prompt {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// No recording was configured and none could be asked for.
    #[error("no recording configured; pass --recording or set source.recording_name")]
    NoRecording,

    /// The ingestion thread could not be started.
    #[error("failed to start ingestion thread: {message}")]
    IngestThread {
        /// Description of the spawn failure.
        message: String,
    },
}
