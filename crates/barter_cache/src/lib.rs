//! # Barter Engine — Active Loop Cache
//!
//! Per-tenant storage of currently-valid scored trade loops (§4.8): the
//! [`cache::ActiveLoopCache`] keyed by canonical identifier with wallet/NFT
//! secondary indexes for O(touched entries) invalidation, and the
//! [`state::LoopStatus`] execution state machine.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod error;
pub mod events;
pub mod state;

pub use cache::{ActiveLoopCache, CachedLoop, CachedStep};
pub use error::{CacheError, CacheResult};
pub use events::CacheChangeEvent;
pub use state::LoopStatus;
