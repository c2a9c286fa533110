use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use futures::FutureExt;
use tokio::sync::Semaphore;

use quarry_core::{
    CacheEntry, CacheStore, EngineConfig, EntryKey, MetricClass, MetricKey, NotAvailable,
    PeriodType, QuarryError, RawPeriodRecord, Resolution, SourceAdapter, SourceKey, Symbol,
    is_complete, needs_refresh,
};
use quarry_middleware::MemoryStore;

use crate::flight::FlightGroup;
use crate::resolver::Walk;

/// Resolves fundamentals across an ordered list of sources, backed by a cache store.
///
/// Cheap to clone; clones share sources, store, permit pool and in-flight requests.
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) sources: Vec<Arc<dyn SourceAdapter>>,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) cfg: EngineConfig,
    permits: Arc<Semaphore>,
    flights: Arc<FlightGroup<EntryKey, Resolution>>,
}

/// Whether a request may be answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Serve a fresh cached record when the staleness policy allows.
    Cached,
    /// Always consult the sources.
    Force,
}

/// Builder for constructing an [`Engine`] with custom configuration.
pub struct EngineBuilder {
    sources: Vec<Arc<dyn SourceAdapter>>,
    store: Option<Arc<dyn CacheStore>>,
    cfg: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Create a builder with default configuration and no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            store: None,
            cfg: EngineConfig::default(),
        }
    }

    /// Register a source. Registration order is the priority order unless
    /// [`source_priority`](Self::source_priority) says otherwise.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.sources.push(source);
        self
    }

    /// Register several sources in order.
    #[must_use]
    pub fn with_sources(
        mut self,
        sources: impl IntoIterator<Item = Arc<dyn SourceAdapter>>,
    ) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Use `store` for cache entries. Defaults to an unbounded in-memory store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Refresh interval for metric classes without an override.
    #[must_use]
    pub const fn refresh_interval(mut self, interval: Duration) -> Self {
        self.cfg.refresh.default_interval = interval;
        self
    }

    /// Refresh interval for one metric class.
    #[must_use]
    pub fn refresh_interval_for(mut self, class: MetricClass, interval: Duration) -> Self {
        self.cfg.refresh.per_class.insert(class, interval);
        self
    }

    /// Eager retries allowed for missing or suspect required metrics.
    #[must_use]
    pub const fn retry_ceiling(mut self, ceiling: u32) -> Self {
        self.cfg.refresh.retry_ceiling = ceiling;
        self
    }

    /// Metrics that must be present and trusted for a record to be complete.
    #[must_use]
    pub fn required_metrics(mut self, metrics: impl IntoIterator<Item = MetricKey>) -> Self {
        self.cfg.refresh.required_metrics = metrics.into_iter().collect();
        self
    }

    /// Timeout applied to each source call.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Timeout applied to each cache store call.
    #[must_use]
    pub const fn store_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.store_timeout = timeout;
        self
    }

    /// Maximum number of refreshes running at once.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.cfg.max_concurrency = n;
        self
    }

    /// Explicit source order by key. Unlisted sources follow in registration order.
    #[must_use]
    pub fn source_priority(mut self, keys: &[SourceKey]) -> Self {
        self.cfg.source_priority = keys.to_vec();
        self
    }

    /// How far back sources look for periods.
    #[must_use]
    pub const fn lookback(mut self, lookback: Duration) -> Self {
        self.cfg.lookback = lookback;
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when no source is registered, two sources share a key,
    /// `max_concurrency` is zero or `retry_ceiling` is zero.
    pub fn build(mut self) -> Result<Engine, QuarryError> {
        if self.sources.is_empty() {
            return Err(QuarryError::InvalidConfig(
                "no sources registered; add at least one via with_source(...)".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for s in &self.sources {
            if !seen.insert(s.key()) {
                return Err(QuarryError::InvalidConfig(format!(
                    "duplicate source key: {}",
                    s.key()
                )));
            }
        }
        if self.cfg.max_concurrency == 0 {
            return Err(QuarryError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.cfg.refresh.retry_ceiling == 0 {
            return Err(QuarryError::InvalidConfig(
                "retry_ceiling must be at least 1".to_string(),
            ));
        }

        // Drop unknown and repeated keys from the priority list.
        let mut listed = HashSet::new();
        self.cfg
            .source_priority
            .retain(|k| seen.contains(k) && listed.insert(k.clone()));
        let sources = ordered(self.sources, &self.cfg.source_priority);

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn CacheStore>);
        Ok(Engine {
            inner: Arc::new(EngineInner {
                sources,
                store,
                permits: Arc::new(Semaphore::new(self.cfg.max_concurrency)),
                flights: Arc::new(FlightGroup::new()),
                cfg: self.cfg,
            }),
        })
    }
}

fn ordered(
    sources: Vec<Arc<dyn SourceAdapter>>,
    priority: &[SourceKey],
) -> Vec<Arc<dyn SourceAdapter>> {
    let pos: HashMap<&SourceKey, usize> =
        priority.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut indexed: Vec<(usize, Arc<dyn SourceAdapter>)> =
        sources.into_iter().enumerate().collect();
    indexed.sort_by_key(|(i, s)| (pos.get(&s.key()).copied().unwrap_or(usize::MAX), *i));
    indexed.into_iter().map(|(_, s)| s).collect()
}

/// Call one source with a timeout, absorbing everything but structural errors.
///
/// Timeouts and transient failures are logged and become an empty result so the
/// resolver falls through to the next source.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "quarry::core::source_call_with_timeout",
        skip(source),
        fields(
            source = %source.key(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ),
    )
)]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) async fn source_call_with_timeout(
    source: &dyn SourceAdapter,
    symbol: &Symbol,
    period_type: PeriodType,
    since: NaiveDate,
    timeout: Duration,
) -> Result<Vec<RawPeriodRecord>, QuarryError> {
    match tokio::time::timeout(timeout, source.fetch(symbol, period_type, since)).await {
        Ok(Ok(records)) => Ok(records),
        Ok(Err(e)) if e.is_structural() => {
            #[cfg(feature = "tracing")]
            tracing::error!(
                source = %source.key(),
                %symbol,
                error = %e,
                "structural error; aborting resolution"
            );
            Err(e)
        }
        Ok(Err(e)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                source = %source.key(),
                %symbol,
                error = %e,
                "source failed; treating as empty"
            );
            Ok(Vec::new())
        }
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(source = %source.key(), %symbol, "source timed out; treating as empty");
            Ok(Vec::new())
        }
    }
}

impl Engine {
    /// Start building a new engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Active configuration (after build-time validation).
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.cfg
    }

    /// Source keys in effective priority order.
    #[must_use]
    pub fn source_order(&self) -> Vec<SourceKey> {
        self.inner.sources.iter().map(|s| s.key()).collect()
    }

    /// Number of resolutions currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.flights.len()
    }

    /// Resolve fundamentals for `symbol`, serving the cached record when it is fresh.
    ///
    /// `symbol` is normalized first (`reliance` becomes `RELIANCE.NS`, `NIFTY 50`
    /// becomes `^NSEI`). Concurrent calls for the same symbol and period share one
    /// resolution.
    ///
    /// # Errors
    /// Only structural errors are returned: an invalid symbol, or a source reporting
    /// an authentication or configuration failure. Exhausted sources produce
    /// `Ok(Resolution::NotAvailable(..))`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quarry::resolve_fundamentals",
            skip(self),
            fields(period = %period_type),
        )
    )]
    pub async fn resolve_fundamentals(
        &self,
        symbol: &str,
        period_type: PeriodType,
    ) -> Result<Resolution, QuarryError> {
        let key = EntryKey::new(Symbol::normalize(symbol)?, period_type);
        self.run(key, Mode::Cached).await
    }

    /// Resolve from the sources regardless of cache freshness.
    ///
    /// Still single-flight: if a resolution for the same key is already running, its
    /// outcome is shared instead of starting another.
    ///
    /// # Errors
    /// As for [`resolve_fundamentals`](Self::resolve_fundamentals).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quarry::refresh_fundamentals",
            skip(self),
            fields(period = %period_type),
        )
    )]
    pub async fn refresh_fundamentals(
        &self,
        symbol: &str,
        period_type: PeriodType,
    ) -> Result<Resolution, QuarryError> {
        let key = EntryKey::new(Symbol::normalize(symbol)?, period_type);
        self.run(key, Mode::Force).await
    }

    /// Mark the cached entry stale so the next request refreshes it.
    ///
    /// Returns `false` when nothing is cached for the symbol and period.
    ///
    /// # Errors
    /// Returns `InvalidSymbol` for a bad symbol and `Store` when the store fails or
    /// times out.
    pub async fn invalidate(
        &self,
        symbol: &str,
        period_type: PeriodType,
    ) -> Result<bool, QuarryError> {
        let key = EntryKey::new(Symbol::normalize(symbol)?, period_type);
        tokio::time::timeout(self.inner.cfg.store_timeout, self.inner.store.invalidate(&key))
            .await
            .unwrap_or_else(|_| Err(QuarryError::Store(format!("invalidate {key} timed out"))))
    }

    /// The stored entry for `symbol`, without triggering resolution.
    ///
    /// # Errors
    /// Returns `InvalidSymbol` for a bad symbol and `Store` when the store fails or
    /// times out.
    pub async fn cached(
        &self,
        symbol: &str,
        period_type: PeriodType,
    ) -> Result<Option<CacheEntry>, QuarryError> {
        let key = EntryKey::new(Symbol::normalize(symbol)?, period_type);
        tokio::time::timeout(self.inner.cfg.store_timeout, self.inner.store.get(&key))
            .await
            .unwrap_or_else(|_| Err(QuarryError::Store(format!("get {key} timed out"))))
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    async fn run(&self, key: EntryKey, mode: Mode) -> Result<Resolution, QuarryError> {
        let inner = Arc::clone(&self.inner);
        let owned = key.clone();
        let (flight, joined) = self
            .inner
            .flights
            .join_or_start(&key, move || inner.resolve_entry(owned, mode).boxed());
        #[cfg(feature = "tracing")]
        {
            if joined {
                tracing::debug!(%key, "joined in-flight resolution");
            }
        }
        flight.await
    }
}

impl EngineInner {
    async fn resolve_entry(
        self: Arc<Self>,
        key: EntryKey,
        mode: Mode,
    ) -> Result<Resolution, QuarryError> {
        let previous = self.load(&key).await;
        if mode == Mode::Cached
            && let Some(entry) = &previous
            && let Some(canonical) = &entry.canonical
            && !needs_refresh(entry, Utc::now(), &self.cfg.refresh)
        {
            return Ok(Resolution::Resolved(canonical.clone()));
        }

        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| QuarryError::Internal(format!("permit pool closed: {e}")))?;

        let now = Utc::now();
        let outcome = Walk {
            sources: &self.sources,
            symbol: &key.symbol,
            period_type: key.period_type,
            since: since(now, self.cfg.lookback),
            timeout: self.cfg.provider_timeout,
            now,
        }
        .run()
        .await?;

        let prev_failures = previous.as_ref().map_or(0, |e| e.consecutive_failures);
        let prev_incomplete = previous.as_ref().map_or(0, |e| e.incomplete_refreshes);
        // A kept record keeps the age it was resolved at.
        let (last_known, known_at) = match previous {
            Some(CacheEntry {
                canonical: Some(c),
                last_resolved_at,
                ..
            }) => (Some(c), last_resolved_at),
            _ => (None, now),
        };

        let (entry, resolution) = match outcome {
            Some(canonical) => {
                let incomplete_refreshes = if is_complete(&canonical, &self.cfg.refresh) {
                    0
                } else {
                    prev_incomplete.saturating_add(1)
                };
                let entry = CacheEntry {
                    key: key.clone(),
                    last_resolved_at: now,
                    canonical: Some(canonical.clone()),
                    consecutive_failures: 0,
                    incomplete_refreshes,
                };
                (entry, Resolution::Resolved(canonical))
            }
            None => {
                let consecutive_failures = prev_failures.saturating_add(1);
                let entry = CacheEntry {
                    key: key.clone(),
                    last_resolved_at: known_at,
                    canonical: last_known.clone(),
                    consecutive_failures,
                    incomplete_refreshes: prev_incomplete,
                };
                let na = NotAvailable {
                    symbol: key.symbol.clone(),
                    period_type: key.period_type,
                    consecutive_failures,
                    last_known,
                };
                (entry, Resolution::NotAvailable(na))
            }
        };
        self.save(entry).await;
        Ok(resolution)
    }

    /// Read an entry; failures and timeouts read as a miss.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    async fn load(&self, key: &EntryKey) -> Option<CacheEntry> {
        match tokio::time::timeout(self.cfg.store_timeout, self.store.get(key)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, error = %e, "cache store read failed; treating as miss");
                None
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "cache store read timed out; treating as miss");
                None
            }
        }
    }

    /// Write an entry; failures and timeouts are logged and otherwise ignored.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    async fn save(&self, entry: CacheEntry) {
        #[cfg(feature = "tracing")]
        let key = entry.key.clone();
        match tokio::time::timeout(self.cfg.store_timeout, self.store.put(entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, error = %e, "cache store write failed");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "cache store write timed out");
            }
        }
    }
}

/// Oldest period end date sources are asked for.
fn since(now: DateTime<Utc>, lookback: Duration) -> NaiveDate {
    TimeDelta::from_std(lookback)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .date_naive()
}
