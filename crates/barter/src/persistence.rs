//! # Persistence Wrappers
//!
//! `serialize_tenant` and `restore_tenant` (§6's persistence contract),
//! combining `barter_persistence`'s byte format with the registry's ability
//! to install an already-built graph and cache as a live tenant.

use barter_core::{EngineResult, TenantConfig};
use barter_shared::TenantId;

use crate::engine::BarterEngine;

impl BarterEngine {
    /// Serializes a tenant's graph and Active Loop Cache into the versioned
    /// snapshot format (§6, `serialize_tenant`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::TenantUnknown` if `tenant` does not exist.
    pub fn serialize_tenant(&self, tenant: &TenantId) -> EngineResult<Vec<u8>> {
        let handle = self.registry.handle(tenant)?;
        Ok(barter_persistence::serialize_tenant(handle.graph(), handle.cache())?)
    }

    /// Restores a tenant from a byte snapshot and installs it as a live,
    /// worker-backed tenant (§6, `restore_tenant`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::IncompatibleSnapshot` if the snapshot's format
    /// version is newer than this build understands, `EngineError::InternalInconsistency`
    /// if the snapshot is otherwise corrupt or unreadable, or `EngineError::InvalidInput`
    /// if `config` fails validation or a tenant with this identifier already
    /// exists.
    pub fn restore_tenant(&self, tenant: TenantId, config: TenantConfig, bytes: &[u8]) -> EngineResult<()> {
        let restored = barter_persistence::restore_tenant(tenant.clone(), bytes)?;
        self.registry.restore_tenant(tenant, config, restored.graph, restored.cache)
    }
}
