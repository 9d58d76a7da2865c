//! # Barter Engine — Shared Primitives
//!
//! Opaque identifiers, fixed-point value arithmetic, and the graph-event
//! envelope shared by every other crate in the workspace.
//!
//! ## CRITICAL RULE
//!
//! This crate must never depend on a specific storage engine, transport, or
//! blockchain library. If you need those, put the dependency in the crate
//! that actually talks to them.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod events;
pub mod fixed_point;
pub mod ids;

pub use error::{SharedError, SharedResult};
pub use events::{EventKind, GraphEvent, Generation};
pub use fixed_point::{FixedPoint, Valuation};
pub use ids::{CollectionId, NftId, TenantId, WalletId};
