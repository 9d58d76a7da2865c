//! Error taxonomy for the Collection Resolver.

use thiserror::Error;

/// Errors the Collection Resolver can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A caller supplied an empty NFT or collection identifier.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for Collection Resolver operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

impl From<CollectionError> for barter_core::EngineError {
    fn from(value: CollectionError) -> Self {
        match value {
            CollectionError::InvalidInput(msg) => barter_core::EngineError::InvalidInput(msg),
        }
    }
}
