use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quarry_types::{CacheEntry, EntryKey, QuarryError};

/// Persistence boundary: one atomic upsert per key, no cross-key transactions.
///
/// Entries are never deleted through this trait; deletion is an administrative
/// action outside the engine.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the entry for `key`, if one exists.
    async fn get(&self, key: &EntryKey) -> Result<Option<CacheEntry>, QuarryError>;

    /// Insert or replace the entry stored under `entry.key`.
    async fn put(&self, entry: CacheEntry) -> Result<(), QuarryError>;

    /// Mark the entry for `key` as stale so the next request refreshes it.
    ///
    /// The default implementation backdates `last_resolved_at` to the Unix epoch and
    /// clears the retry counters through a read-modify-write. Returns `false` when no
    /// entry exists.
    async fn invalidate(&self, key: &EntryKey) -> Result<bool, QuarryError> {
        let Some(mut entry) = self.get(key).await? else {
            return Ok(false);
        };
        entry.last_resolved_at = DateTime::<Utc>::UNIX_EPOCH;
        entry.consecutive_failures = 0;
        entry.incomplete_refreshes = 0;
        self.put(entry).await?;
        Ok(true)
    }
}
