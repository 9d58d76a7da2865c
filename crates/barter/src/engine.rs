//! # Engine Facade
//!
//! [`BarterEngine`] ties the Tenant Registry, the shared Collection Resolver,
//! and per-tenant event subscriptions into the single entry point an external
//! collaborator talks to (§6). Mirrors the teacher's `oroboros_economy::integration::TheBank`:
//! one struct wrapping several independently-testable subsystems behind a
//! small, high-level operation surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use barter_collection::{CollectionResolver, ResolverConfig};
use barter_concurrency::TenantRegistry;
use barter_shared::TenantId;

use crate::subscription::Subscription;

/// Identifies one registered subscription so it can later be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// The engine's single entry point: tenant administration, ingestion,
/// discovery queries, persistence, and event subscriptions.
pub struct BarterEngine {
    pub(crate) registry: TenantRegistry,
    pub(crate) collections: CollectionResolver,
    pub(crate) subscriptions: RwLock<HashMap<TenantId, HashMap<SubscriptionId, Subscription>>>,
    next_subscription_id: AtomicU64,
}

impl BarterEngine {
    /// Builds an engine with an empty tenant registry and the given
    /// Collection Resolver configuration.
    #[must_use]
    pub fn new(resolver_config: ResolverConfig) -> Self {
        Self {
            registry: TenantRegistry::new(),
            collections: CollectionResolver::new(resolver_config),
            subscriptions: RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for BarterEngine {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
