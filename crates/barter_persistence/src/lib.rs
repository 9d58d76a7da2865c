//! # Barter Engine — Persistence
//!
//! The optional persistence contract (§6): `serialize_tenant` and
//! `restore_tenant` round-trip a tenant's graph and active loop cache
//! through a versioned, checksummed byte format, so a restarted engine can
//! resume without a full recomputation. Unknown format versions are
//! refused with [`barter_core::EngineError::IncompatibleSnapshot`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod snapshot;

pub use error::{PersistenceError, PersistenceResult};
pub use snapshot::{restore_tenant, serialize_tenant, RestoredTenant, SNAPSHOT_VERSION};
