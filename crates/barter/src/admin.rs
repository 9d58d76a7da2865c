//! # Tenant Administration and Event Subscriptions
//!
//! Thin wrappers over [`barter_concurrency::TenantRegistry`] plus the
//! subscription lifecycle (§6: "an external collaborator may register a
//! callback invoked when the Active Loop Cache gains or loses a loop").

use barter_core::{EngineResult, TenantConfig};
use barter_shared::TenantId;
use tracing::warn;

use crate::engine::{BarterEngine, SubscriptionId};
use crate::subscription::{Delivery, DeliveryResult, Subscription, SubscriptionConfig};

impl BarterEngine {
    /// Creates a tenant with `config` (§6, `create_tenant`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if `config` fails validation or
    /// the tenant already exists.
    pub fn create_tenant(&self, tenant: TenantId, config: TenantConfig) -> EngineResult<()> {
        self.registry.create_tenant(tenant, config)
    }

    /// Deletes a tenant, stopping its worker and cancelling every
    /// subscription registered against it (§6, `delete_tenant`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::TenantUnknown` if no such tenant exists.
    pub fn delete_tenant(&self, tenant: &TenantId) -> EngineResult<()> {
        self.registry.delete_tenant(tenant)?;
        if let Some(mut subs) = self.subscriptions.write().remove(tenant) {
            for (_, mut subscription) in subs.drain() {
                subscription.stop();
            }
        }
        Ok(())
    }

    /// A tenant's current health snapshot (§6, `get_tenant_status`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::TenantUnknown` if no such tenant exists.
    pub fn get_tenant_status(&self, tenant: &TenantId) -> EngineResult<barter_concurrency::TenantStatus> {
        self.registry.status(tenant)
    }

    /// Every tenant identifier currently registered.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        self.registry.tenant_ids()
    }

    /// Registers `callback` to be invoked, at-least-once with exponential
    /// backoff retry, for every loop `tenant`'s Active Loop Cache gains or
    /// loses from this point on. Returns an identifier that can later be
    /// passed to [`BarterEngine::unsubscribe`].
    ///
    /// # Errors
    ///
    /// Returns `EngineError::TenantUnknown` if no such tenant exists.
    pub fn subscribe(
        &self,
        tenant: &TenantId,
        config: SubscriptionConfig,
        callback: impl Fn(Delivery) -> DeliveryResult + Send + 'static,
    ) -> EngineResult<SubscriptionId> {
        let handle = self.registry.handle(tenant)?;
        let id = self.next_subscription_id();
        let label = format!("{tenant}-{}", id.0);

        let subscription = Subscription::start(label, config, callback);
        handle.cache().add_listener(subscription.sender());

        self.subscriptions
            .write()
            .entry(tenant.clone())
            .or_default()
            .insert(id, subscription);
        Ok(id)
    }

    /// Cancels a subscription. A no-op if `tenant` or `id` is unknown (the
    /// tenant may already have been deleted, which cancels every subscription
    /// registered against it).
    pub fn unsubscribe(&self, tenant: &TenantId, id: SubscriptionId) {
        let mut subscriptions = self.subscriptions.write();
        let Some(subs) = subscriptions.get_mut(tenant) else {
            return;
        };
        if let Some(mut subscription) = subs.remove(&id) {
            subscription.stop();
        } else {
            warn!(%tenant, "unsubscribe called with unknown subscription id");
        }
    }
}
