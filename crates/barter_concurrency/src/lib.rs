//! # Barter Engine — Concurrency
//!
//! The Tenant Registry and per-tenant worker pools (§5): one dedicated
//! thread per tenant, a bounded mutation channel providing backpressure, and
//! generation-gated installation of discovery results into the Active Loop
//! Cache. Panics inside one tenant's reconciliation are caught and logged;
//! they never propagate to another tenant's thread.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod registry;
pub mod worker;

pub use registry::TenantRegistry;
pub use worker::{TenantHandle, TenantStatus};
