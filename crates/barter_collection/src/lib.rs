//! # Barter Engine — Collection Resolver
//!
//! A shared, read-mostly cache mapping NFTs to collections and collections
//! to member NFTs (§2, §4.3). Feature-flag gated from the algorithm's
//! perspective: when a tenant disables collection wants, callers simply stop
//! consulting this crate rather than this crate enforcing the flag itself.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod resolver;

pub use error::{CollectionError, CollectionResult};
pub use resolver::{CollectionResolver, ResolverConfig};
