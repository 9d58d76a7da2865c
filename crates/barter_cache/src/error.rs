//! Error taxonomy for the Active Loop Cache.

use thiserror::Error;

/// Errors the Active Loop Cache can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A status transition was requested on a loop the cache does not hold.
    #[error("unknown canonical identifier: {0}")]
    UnknownLoop(String),

    /// A status transition violated the loop state machine (§4.8).
    #[error("invalid loop transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// The loop's status before the attempted transition.
        from: crate::state::LoopStatus,
        /// The requested (rejected) status.
        to: crate::state::LoopStatus,
    },
}

/// Result type for Active Loop Cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
