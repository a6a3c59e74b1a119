//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Only surfaced by the persistence layer; controller commands never fail
/// across their public boundary.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Snapshot is not well-formed JSON of the expected shape
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// Snapshot parsed but a field holds an impossible value
    #[error("Invalid snapshot field `{field}`: {reason}")]
    InvalidSnapshotField {
        field: &'static str,
        reason: String,
    },

    /// Key-value store failure
    #[error("Store error: {0}")]
    Store(#[from] tonearm_core::CoreError),

    /// Persistence is disabled (store failed its startup probe)
    #[error("Persistence disabled")]
    PersistenceDisabled,

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
