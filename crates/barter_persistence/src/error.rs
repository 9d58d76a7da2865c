//! # Persistence Error Taxonomy

use thiserror::Error;

/// Errors produced while serializing or restoring a tenant snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The byte stream did not start with the expected magic bytes.
    #[error("not a tenant snapshot: bad magic bytes")]
    BadMagic,

    /// The snapshot's format version is newer than this build understands.
    #[error("incompatible snapshot version: got {found}, supported up to {max_supported}")]
    IncompatibleVersion {
        /// The version byte read from the snapshot.
        found: u32,
        /// The highest version this build can restore.
        max_supported: u32,
    },

    /// The snapshot was truncated or otherwise too short to contain a
    /// header and the payload it claims to hold.
    #[error("truncated snapshot: {0}")]
    Truncated(String),

    /// The payload's CRC32 did not match the one stored in the snapshot.
    #[error("snapshot payload failed integrity check (CRC mismatch)")]
    Corrupt,

    /// The JSON payload could not be decoded into the expected shape.
    #[error("snapshot payload decode failed: {0}")]
    Decode(String),

    /// Replaying the restored entities into a fresh graph violated an
    /// engine invariant (e.g. an NFT with no owner).
    #[error("snapshot replay failed: {0}")]
    Replay(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<PersistenceError> for barter_core::EngineError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::IncompatibleVersion { found, max_supported } => {
                barter_core::EngineError::IncompatibleSnapshot { found, max_supported }
            }
            other => barter_core::EngineError::InternalInconsistency(other.to_string()),
        }
    }
}
