//! # Engine Error Taxonomy
//!
//! The error kinds surfaced to external collaborators, per §7 of the
//! specification. `Timeout` and `StaleGeneration` are deliberately absent
//! from this enum: the spec requires `Timeout` to reach callers as a flag on
//! a successful response, never as an `Err`, and `StaleGeneration` to never
//! reach callers at all — it is an internal signal consumed by
//! `barter_concurrency`.

use thiserror::Error;

/// Errors synchronously returned to callers of the engine's public surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An identifier was empty or otherwise malformed, a valuation was
    /// negative, or a wallet tried to want an NFT it already owns.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation named a tenant that has not been created (or has
    /// since been deleted).
    #[error("unknown tenant: {0}")]
    TenantUnknown(String),

    /// The tenant's event channel is saturated; retry after backing off.
    #[error("tenant busy, retry after {retry_after_ms}ms")]
    TenantBusy {
        /// Suggested minimum backoff before retrying, in milliseconds.
        retry_after_ms: u64,
    },

    /// A persistence snapshot was produced by a format version this build
    /// does not understand.
    #[error("incompatible snapshot version: got {found}, supported up to {max_supported}")]
    IncompatibleSnapshot {
        /// The version byte read from the snapshot.
        found: u32,
        /// The highest version this build can restore.
        max_supported: u32,
    },

    /// An invariant check failed (e.g. an NFT observed with two owners
    /// during compaction). Logged and triggers a full recomputation of the
    /// affected community; only surfaced to a caller whose query directly
    /// depended on the inconsistent entity.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

/// Result type for operations that can fail with an [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;
