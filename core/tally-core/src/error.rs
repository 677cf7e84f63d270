//! Error types for tally-core operations.

use std::path::PathBuf;

/// All errors that can occur in tally-core operations.
///
/// Load paths deliberately do not produce errors: a missing or corrupt
/// storage slot degrades to an empty track set. These variants cover the
/// write side, where failures must reach the caller so it can surface a
/// warning instead of silently dropping state.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage slot path has no parent directory: {0}")]
    SlotPathInvalid(PathBuf),
}

/// Convenience type alias for Results using TallyError.
pub type Result<T> = std::result::Result<T, TallyError>;
