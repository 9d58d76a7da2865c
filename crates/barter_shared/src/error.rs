//! # Shared Error Types
//!
//! Errors common to low-level shared types. Component-specific errors
//! (graph mutation, discovery, persistence) live in their own crates and
//! wrap these where they cross a boundary.

use thiserror::Error;

/// Errors produced by `barter_shared` primitives.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedError {
    /// A fixed-point arithmetic operation overflowed.
    #[error("arithmetic overflow in fixed-point calculation")]
    ArithmeticOverflow,
}

/// Result type for `barter_shared` operations.
pub type SharedResult<T> = Result<T, SharedError>;
