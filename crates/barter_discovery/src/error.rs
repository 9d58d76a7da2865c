//! Error taxonomy for the discovery pipeline.

use thiserror::Error;

/// Errors the discovery pipeline can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A work unit's configuration was internally inconsistent (e.g. zero
    /// wall-clock budget).
    #[error("invalid discovery configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for discovery pipeline operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
