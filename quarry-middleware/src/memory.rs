use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use quarry_core::{CacheEntry, CacheStore, EntryKey, QuarryError};

/// In-process [`CacheStore`] backed by a concurrent `moka` cache.
///
/// Unbounded unless built with [`MemoryStore::bounded`].
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<EntryKey, CacheEntry>,
}

impl MemoryStore {
    /// Unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    /// Store that evicts beyond `max_entries` and after `time_to_idle` without access.
    #[must_use]
    pub fn bounded(max_entries: u64, time_to_idle: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// Number of stored entries (approximate while writes are pending).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    /// True when the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &EntryKey) -> Result<Option<CacheEntry>, QuarryError> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), QuarryError> {
        self.inner.insert(entry.key.clone(), entry).await;
        Ok(())
    }
}
