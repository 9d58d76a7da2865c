//! # Tenant Registry
//!
//! Maps tenant identifiers to their [`TenantHandle`] (graph, cache, worker
//! thread). The single `RwLock<HashMap<...>>` here is only ever held for the
//! duration of a map lookup or insert/remove — never across a mutation or a
//! discovery pass, which is why every entry is wrapped in its own `Arc` (§5).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use barter_cache::ActiveLoopCache;
use barter_core::{EngineError, EngineResult, TenantConfig, TenantGraph};
use barter_shared::TenantId;

use crate::worker::{TenantHandle, TenantStatus};

/// Owns every tenant's worker thread, graph, and cache.
#[derive(Default)]
pub struct TenantRegistry {
    tenants: RwLock<HashMap<TenantId, Arc<TenantHandle>>>,
}

impl TenantRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tenant with `config`, spawning its worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `config` fails validation,
    /// or if a tenant with this identifier already exists.
    pub fn create_tenant(&self, tenant: TenantId, config: TenantConfig) -> EngineResult<()> {
        config.validate()?;

        let mut tenants = self.tenants.write();
        if tenants.contains_key(&tenant) {
            return Err(EngineError::InvalidInput(format!(
                "tenant already exists: {tenant}"
            )));
        }

        info!(%tenant, "tenant created");
        tenants.insert(tenant.clone(), Arc::new(TenantHandle::spawn(tenant, config)));
        Ok(())
    }

    /// Installs a tenant from an already-built graph and cache, e.g. one
    /// produced by [`barter_persistence::restore_tenant`](../barter_persistence/fn.restore_tenant.html),
    /// spawning its worker thread over them instead of over empty state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `config` fails validation, or
    /// if a tenant with this identifier already exists.
    pub fn restore_tenant(
        &self,
        tenant: TenantId,
        config: TenantConfig,
        graph: TenantGraph,
        cache: ActiveLoopCache,
    ) -> EngineResult<()> {
        config.validate()?;

        let mut tenants = self.tenants.write();
        if tenants.contains_key(&tenant) {
            return Err(EngineError::InvalidInput(format!(
                "tenant already exists: {tenant}"
            )));
        }

        info!(%tenant, "tenant restored from snapshot");
        tenants.insert(
            tenant.clone(),
            Arc::new(TenantHandle::spawn_with_state(tenant, config, graph, cache)),
        );
        Ok(())
    }

    /// Removes a tenant and stops its worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if no such tenant exists.
    pub fn delete_tenant(&self, tenant: &TenantId) -> EngineResult<()> {
        let removed = self.tenants.write().remove(tenant);
        match removed {
            Some(handle) => {
                // The handle may still be referenced by an in-flight query;
                // its worker thread is joined when the last `Arc` drops.
                drop(handle);
                info!(%tenant, "tenant deleted");
                Ok(())
            }
            None => Err(EngineError::TenantUnknown(tenant.to_string())),
        }
    }

    /// Looks up a tenant's handle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if no such tenant exists.
    pub fn handle(&self, tenant: &TenantId) -> EngineResult<Arc<TenantHandle>> {
        self.tenants
            .read()
            .get(tenant)
            .cloned()
            .ok_or_else(|| EngineError::TenantUnknown(tenant.to_string()))
    }

    /// A tenant's current health snapshot (§6, `get_tenant_status`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if no such tenant exists.
    pub fn status(&self, tenant: &TenantId) -> EngineResult<TenantStatus> {
        Ok(self.handle(tenant)?.status())
    }

    /// Every tenant identifier currently registered.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        self.tenants.read().keys().cloned().collect()
    }

    /// Number of registered tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    /// Whether the registry holds no tenants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TenantRegistry {
    fn drop(&mut self) {
        if !self.is_empty() {
            warn!(count = self.len(), "registry dropped with tenants still registered");
        }
    }
}
