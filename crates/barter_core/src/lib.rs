//! # Barter Engine — Core
//!
//! The tenant-scoped living graph: wallets, NFTs, wants, and the
//! generation-gated mutation surface described in §3–§4.1 of the engine
//! specification. Downstream crates (`barter_discovery`, `barter_cache`,
//! `barter_concurrency`) read this crate's [`graph::GraphSnapshot`] but never
//! mutate a [`graph::TenantGraph`] directly except through its own methods.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod graph;
pub mod model;

pub use config::{FeatureFlags, TenantConfig, SCORE_DIMENSIONS};
pub use error::{EngineError, EngineResult};
pub use graph::{GraphSnapshot, TenantGraph};
pub use model::{Nft, NftMetadata, PlatformData, Wallet, Want};
