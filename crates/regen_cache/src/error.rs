//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Comparisons themselves are total: the only way a comparison fails is
/// cancellation. The remaining variants come from persistence and output
/// sinks. Reads from disk are fail-safe and turn problems into cache misses
/// rather than errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A comparison was interrupted by the host's cancellation flag.
    ///
    /// No flags were committed and no result is reported for the key.
    #[error("comparison for '{key}' was cancelled")]
    Cancelled {
        /// The key whose comparison was interrupted.
        key: String,
    },

    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// An output sink failed to commit generated output for a key.
    #[error("failed to emit output for '{key}': {reason}")]
    Emit {
        /// The key whose output could not be committed.
        key: String,
        /// Description of the failure.
        reason: String,
    },
}
