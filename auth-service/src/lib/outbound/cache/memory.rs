use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::cache_key;
use crate::credential::errors::CacheError;
use crate::credential::models::CacheEntry;
use crate::credential::models::Username;
use crate::credential::ports::CredentialCache;

const DEFAULT_MAX_ENTRIES: usize = 10_000;

enum Slot {
    Entry(CacheEntry),
    /// Left by `invalidate`; reads as a miss and blocks `put` until it expires.
    Invalidated,
}

struct StoredSlot {
    slot: Slot,
    deadline: Instant,
}

impl StoredSlot {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline <= now
    }
}

/// Process-local credential cache.
///
/// Used when no Redis URL is configured or Redis cannot be reached at
/// startup. Not shared between instances. Expired slots are swept on every
/// write and the map never holds more than `max_entries` slots.
pub struct InMemoryCredentialCache {
    slots: RwLock<HashMap<String, StoredSlot>>,
    max_entries: usize,
}

impl Default for InMemoryCredentialCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl InMemoryCredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live cached entries. Invalidation markers are not counted.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .read()
            .values()
            .filter(|stored| !stored.is_expired(now) && matches!(stored.slot, Slot::Entry(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired slot and return how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut slots = self.slots.write();
        sweep(&mut slots, Instant::now())
    }

    /// Insert under the write lock, making room first.
    fn insert(&self, slots: &mut HashMap<String, StoredSlot>, key: String, stored: StoredSlot) {
        sweep(slots, Instant::now());

        if !slots.contains_key(&key) && slots.len() >= self.max_entries {
            let soonest = slots
                .iter()
                .min_by_key(|(_, stored)| stored.deadline)
                .map(|(key, _)| key.clone());
            if let Some(soonest) = soonest {
                slots.remove(&soonest);
            }
        }

        slots.insert(key, stored);
    }
}

fn sweep(slots: &mut HashMap<String, StoredSlot>, now: Instant) -> usize {
    let before = slots.len();
    slots.retain(|_, stored| !stored.is_expired(now));
    before - slots.len()
}

#[async_trait]
impl CredentialCache for InMemoryCredentialCache {
    async fn get(&self, username: &Username) -> Result<Option<CacheEntry>, CacheError> {
        let key = cache_key(username);

        {
            let slots = self.slots.read();
            match slots.get(&key) {
                Some(stored) if !stored.is_expired(Instant::now()) => {
                    return Ok(match &stored.slot {
                        Slot::Entry(entry) => Some(entry.clone()),
                        Slot::Invalidated => None,
                    })
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired
        let mut slots = self.slots.write();
        if slots
            .get(&key)
            .is_some_and(|stored| stored.is_expired(Instant::now()))
        {
            slots.remove(&key);
        }
        Ok(None)
    }

    async fn put(
        &self,
        username: &Username,
        entry: &CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = cache_key(username);
        let now = Instant::now();
        let mut slots = self.slots.write();

        if slots.get(&key).is_some_and(|stored| !stored.is_expired(now)) {
            return Ok(());
        }

        let stored = StoredSlot {
            slot: Slot::Entry(entry.clone()),
            deadline: now + ttl,
        };
        self.insert(&mut slots, key, stored);
        Ok(())
    }

    async fn invalidate(&self, username: &Username, hold: Duration) -> Result<(), CacheError> {
        let stored = StoredSlot {
            slot: Slot::Invalidated,
            deadline: Instant::now() + hold,
        };
        let mut slots = self.slots.write();
        self.insert(&mut slots, cache_key(username), stored);
        Ok(())
    }
}
