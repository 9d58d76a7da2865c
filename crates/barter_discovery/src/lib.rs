//! # Barter Engine — Discovery
//!
//! The Unified Graph View, Delta Detector, SCC Partitioner, optional
//! community refinement, Cycle Enumerator, and Canonicalizer (§4.2–§4.6).
//! Everything here is a pure function of a [`barter_core::GraphSnapshot`]
//! plus a [`barter_core::TenantConfig`] — no locking, no I/O, safe to call
//! from any worker thread.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod canonical;
pub mod community;
pub mod cycles;
pub mod delta;
pub mod dupfilter;
pub mod error;
pub mod pipeline;
pub mod scc;
pub mod view;

pub use canonical::{canonical_id, CycleStep};
pub use cycles::{CandidateCycle, EnumerationOutcome, EnumeratorConfig};
pub use delta::{affected_community, AffectedCommunity};
pub use dupfilter::DupFilter;
pub use error::{DiscoveryError, DiscoveryResult};
pub use pipeline::{discover, PipelineOutcome};
pub use scc::{strongly_connected_components, WorkUnit};
pub use view::{Edge, UnifiedGraphView};
