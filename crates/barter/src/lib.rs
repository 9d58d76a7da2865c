//! # Barter Engine — Facade
//!
//! The single entry point external collaborators talk to (§6): tenant
//! administration, inventory and want ingestion, discovery queries,
//! persistence, and event subscriptions, all layered over the lower crates'
//! tenant registry, graph, Active Loop Cache, and Collection Resolver.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod admin;
pub mod discovery;
pub mod engine;
pub mod inventory;
pub mod persistence;
pub mod subscription;
mod time;

mod scenarios;

pub use discovery::{DiscoverResult, DiscoverSettings};
pub use engine::{BarterEngine, SubscriptionId};
pub use inventory::{InventoryAck, NftSubmission};
pub use subscription::{Delivery, DeliveryResult, Subscription, SubscriptionConfig};
