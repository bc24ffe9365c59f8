use std::{
    collections::HashMap,
    sync::atomic::{
        AtomicUsize,
        Ordering,
    },
    time::{
        Duration,
        Instant,
    },
};

use parking_lot::RwLock;

use crate::blocklist::{
    BlocklistStore,
    StoreError,
};

/// Inserts between two sweeps of expired entries
const SWEEP_INTERVAL: usize = 1024;

#[derive(Debug)]
struct Entry {
    value: String,
    /// `None` when `now + ttl` is past what an `Instant` can hold
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, now: Instant, ttl: Duration) -> Self {
        Self {
            value: value.to_owned(),
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`BlocklistStore`].
///
/// Expired entries are dropped when read, on a sweep run every 1024 inserts, or in
/// bulk by [`MemoryStore::purge_expired`]. State is lost on restart and not shared
/// between processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    inserts: AtomicUsize,
}

impl MemoryStore {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    fn insert(
        &self,
        entries: &mut HashMap<String, Entry>,
        key: &str,
        entry: Entry,
        now: Instant,
    ) {
        if self.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            let before = entries.len();
            entries.retain(|_, e| e.is_live(now));
            tracing::trace!(dropped = before - entries.len(), "swept expired blocklist entries");
        }
        entries.insert(key.to_owned(), entry);
    }

    /// Number of entries held, including expired ones not yet purged
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// `true` when no entries are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl BlocklistStore for MemoryStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        self.insert(&mut entries, key, Entry::new(value, now, ttl), now);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(e) if e.is_live(now) => return Ok(Some(e.value.clone())),
                Some(_) => {}
            }
        }
        // expired; evict unless it was replaced in the meantime
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        self.insert(&mut entries, key, Entry::new(value, now, ttl), now);
        Ok(true)
    }
}
