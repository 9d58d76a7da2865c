//! # Cache Change Events
//!
//! Fired when the Active Loop Cache gains or loses a loop (§6, event
//! subscription). Listeners register a channel via
//! [`crate::cache::ActiveLoopCache::add_listener`]; delivery here is
//! best-effort (`try_send`, dropped if a listener's queue is full) — the
//! facade's subscription layer is responsible for at-least-once delivery to
//! external callbacks, not this internal fan-out. Mirrors the teacher's
//! `oroboros_blockchain::ipc::IpcListener::subscribe` fan-out: a cloneable
//! receiver per interested party, published over a bounded channel.

use barter_shared::TenantId;

use crate::cache::CachedLoop;

/// One change to a tenant's Active Loop Cache contents.
#[derive(Clone, Debug)]
pub enum CacheChangeEvent {
    /// A loop was newly inserted (not a refresh of an already-cached entry).
    Gained {
        /// The tenant this cache belongs to.
        tenant: TenantId,
        /// The loop that was gained.
        loop_: CachedLoop,
    },
    /// A loop was removed from the cache.
    Lost {
        /// The tenant this cache belongs to.
        tenant: TenantId,
        /// The canonical identifier of the loop that was lost.
        canonical_id: String,
    },
}
