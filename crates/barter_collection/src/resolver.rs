//! # Collection Resolver
//!
//! A shared, tenant-agnostic cache (§2, §4.3, §5) mapping NFTs to the
//! collection they belong to and collections to their member NFTs. Entries
//! are supplied by external collaborators (the host knows collection
//! membership; the engine never infers it) and are evicted by TTL or, once
//! capacity is exceeded, by least-recent access.
//!
//! Protected by a single read-write lock, as the spec requires (§5:
//! "mutations are single-writer"); reads vastly outnumber writes in
//! practice, which is the shape `parking_lot::RwLock` is built for.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use barter_shared::{CollectionId, NftId};

use crate::error::{CollectionError, CollectionResult};

struct Entry {
    members: BTreeSet<NftId>,
    inserted_at: Instant,
    last_access: u64,
}

struct ResolverState {
    collections: HashMap<CollectionId, Entry>,
    nft_index: HashMap<NftId, CollectionId>,
    clock: u64,
}

impl ResolverState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn is_expired(&self, entry: &Entry, ttl: Duration) -> bool {
        entry.inserted_at.elapsed() > ttl
    }

    fn evict_expired_and_over_capacity(&mut self, ttl: Duration, capacity: usize) {
        let expired: Vec<CollectionId> = self
            .collections
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            self.drop_collection(&id);
        }

        while self.collections.len() > capacity {
            let Some(lru) = self
                .collections
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.drop_collection(&lru);
        }
    }

    fn drop_collection(&mut self, id: &CollectionId) {
        if let Some(entry) = self.collections.remove(id) {
            for nft in entry.members {
                self.nft_index.remove(&nft);
            }
        }
    }
}

/// Configuration for a [`CollectionResolver`] (§5: "TTL and a max capacity;
/// eviction is LRU").
#[derive(Clone, Copy, Debug)]
pub struct ResolverConfig {
    /// Maximum number of distinct collections cached at once.
    pub capacity: usize,
    /// Time-to-live for a collection's membership entry.
    pub ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}

/// The shared Collection Resolver cache.
pub struct CollectionResolver {
    config: ResolverConfig,
    state: RwLock<ResolverState>,
}

impl CollectionResolver {
    /// Builds an empty resolver with the given configuration.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            state: RwLock::new(ResolverState {
                collections: HashMap::new(),
                nft_index: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Records that `nft` belongs to `collection`, supplementing (not
    /// replacing) any existing membership list for that collection.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidInput`] if either identifier is empty.
    pub fn record_membership(&self, nft: NftId, collection: CollectionId) -> CollectionResult<()> {
        if nft.is_empty() || collection.is_empty() {
            return Err(CollectionError::InvalidInput(
                "nft and collection identifiers must not be empty".to_string(),
            ));
        }

        let mut state = self.state.write();
        if let Some(previous) = state.nft_index.get(&nft).cloned() {
            if previous != collection {
                if let Some(entry) = state.collections.get_mut(&previous) {
                    entry.members.remove(&nft);
                }
            }
        }

        let tick = state.tick();
        let entry = state.collections.entry(collection.clone()).or_insert_with(|| Entry {
            members: BTreeSet::new(),
            inserted_at: Instant::now(),
            last_access: tick,
        });
        entry.members.insert(nft.clone());
        entry.last_access = tick;
        state.nft_index.insert(nft, collection);

        let (ttl, capacity) = (self.config.ttl, self.config.capacity);
        state.evict_expired_and_over_capacity(ttl, capacity);
        Ok(())
    }

    /// Removes `nft` from whatever collection it was recorded under, if any.
    pub fn forget_nft(&self, nft: &NftId) {
        let mut state = self.state.write();
        if let Some(collection) = state.nft_index.remove(nft) {
            if let Some(entry) = state.collections.get_mut(&collection) {
                entry.members.remove(nft);
            }
        }
    }

    /// Returns the collection `nft` belongs to, if known and not expired.
    #[must_use]
    pub fn collection_of(&self, nft: &NftId) -> Option<CollectionId> {
        let mut state = self.state.write();
        let collection = state.nft_index.get(nft).cloned()?;
        let ttl = self.config.ttl;
        let expired = match state.collections.get(&collection) {
            Some(entry) => state.is_expired(entry, ttl),
            None => false,
        };
        if expired {
            state.drop_collection(&collection);
            return None;
        }
        let tick = state.tick();
        if let Some(entry) = state.collections.get_mut(&collection) {
            entry.last_access = tick;
        }
        Some(collection)
    }

    /// Returns every NFT currently recorded as a member of `collection`, or
    /// an empty set if the collection is unknown or its entry has expired.
    #[must_use]
    pub fn members_of(&self, collection: &CollectionId) -> BTreeSet<NftId> {
        let mut state = self.state.write();
        let ttl = self.config.ttl;
        let expired = match state.collections.get(collection) {
            Some(entry) => state.is_expired(entry, ttl),
            None => return BTreeSet::new(),
        };
        if expired {
            state.drop_collection(collection);
            return BTreeSet::new();
        }
        let tick = state.tick();
        let entry = state.collections.get_mut(collection).expect("checked above");
        entry.last_access = tick;
        entry.members.clone()
    }

    /// Number of collections currently cached (for diagnostics/tests).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().collections.len()
    }

    /// Whether the cache currently holds no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_resolves_membership_both_directions() {
        let resolver = CollectionResolver::new(ResolverConfig::default());
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("apes"))
            .unwrap();

        assert_eq!(resolver.collection_of(&NftId::new("alpha")), Some(CollectionId::new("apes")));
        assert!(resolver.members_of(&CollectionId::new("apes")).contains(&NftId::new("alpha")));
    }

    #[test]
    fn unknown_collection_returns_empty_set() {
        let resolver = CollectionResolver::new(ResolverConfig::default());
        assert!(resolver.members_of(&CollectionId::new("ghost")).is_empty());
    }

    #[test]
    fn rejects_empty_identifiers() {
        let resolver = CollectionResolver::new(ResolverConfig::default());
        assert!(resolver
            .record_membership(NftId::new(""), CollectionId::new("apes"))
            .is_err());
    }

    #[test]
    fn moving_nft_between_collections_updates_both_entries() {
        let resolver = CollectionResolver::new(ResolverConfig::default());
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("apes"))
            .unwrap();
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("punks"))
            .unwrap();

        assert!(!resolver.members_of(&CollectionId::new("apes")).contains(&NftId::new("alpha")));
        assert!(resolver.members_of(&CollectionId::new("punks")).contains(&NftId::new("alpha")));
    }

    #[test]
    fn capacity_eviction_drops_least_recently_used_collection() {
        let resolver = CollectionResolver::new(ResolverConfig {
            capacity: 1,
            ttl: Duration::from_secs(300),
        });
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("apes"))
            .unwrap();
        resolver
            .record_membership(NftId::new("beta"), CollectionId::new("punks"))
            .unwrap();

        assert_eq!(resolver.len(), 1);
        assert!(resolver.members_of(&CollectionId::new("apes")).is_empty());
        assert!(resolver.members_of(&CollectionId::new("punks")).contains(&NftId::new("beta")));
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let resolver = CollectionResolver::new(ResolverConfig {
            capacity: 10,
            ttl: Duration::from_millis(0),
        });
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("apes"))
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(resolver.members_of(&CollectionId::new("apes")).is_empty());
    }

    #[test]
    fn forget_nft_removes_it_from_its_collection() {
        let resolver = CollectionResolver::new(ResolverConfig::default());
        resolver
            .record_membership(NftId::new("alpha"), CollectionId::new("apes"))
            .unwrap();
        resolver.forget_nft(&NftId::new("alpha"));

        assert_eq!(resolver.collection_of(&NftId::new("alpha")), None);
        assert!(resolver.members_of(&CollectionId::new("apes")).is_empty());
    }
}
