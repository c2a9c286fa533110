// Shared fixtures for engine tests: `use crate::helpers::*;`
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use quarry::{
    CacheEntry, CacheStore, CanonicalFundamentals, EngineBuilder, EntryKey, PeriodType,
    QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol,
};
use quarry_mock::MockSource;
use quarry_mock::fixtures::complete_statement;

pub use quarry_mock::fixtures::{day, earnings_record, statement_record, sym};

pub const RELIANCE: &str = "RELIANCE.NS";
pub const TCS: &str = "TCS.NS";
pub const INFY: &str = "INFY.NS";

/// Route engine logs to the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Erase a mock into the trait object the builder expects.
pub fn dyn_source(m: &Arc<MockSource>) -> Arc<dyn SourceAdapter> {
    Arc::clone(m) as Arc<dyn SourceAdapter>
}

/// Builder pre-loaded with `sources` in order.
pub fn engine_with(sources: &[&Arc<MockSource>]) -> EngineBuilder {
    sources
        .iter()
        .fold(quarry::Engine::builder(), |b, s| b.with_source(dyn_source(s)))
}

/// Quarterly row with every default required metric populated.
pub fn complete(end: NaiveDate) -> RawPeriodRecord {
    complete_statement(end, 1_000_000)
}

/// Canonical record as a source named `source` would have produced it.
pub fn canonical(
    symbol: &str,
    record: &RawPeriodRecord,
    source: &'static str,
) -> CanonicalFundamentals {
    quarry_core::canonicalize(&sym(symbol), record, SourceKey::new(source), Utc::now())
}

/// Cache entry resolved `age` ago.
pub fn entry_aged(canonical: CanonicalFundamentals, age: Duration) -> CacheEntry {
    let key = EntryKey::new(canonical.symbol.clone(), canonical.period_type);
    let resolved_at = Utc::now() - chrono::TimeDelta::from_std(age).unwrap();
    CacheEntry {
        key,
        last_resolved_at: resolved_at,
        canonical: Some(canonical),
        consecutive_failures: 0,
        incomplete_refreshes: 0,
    }
}

pub fn quarterly(symbol: &str) -> EntryKey {
    EntryKey::new(sym(symbol), PeriodType::Quarterly)
}

/// Store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &EntryKey) -> Result<Option<CacheEntry>, QuarryError> {
        Err(QuarryError::Store("backend unavailable".into()))
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), QuarryError> {
        Err(QuarryError::Store("backend unavailable".into()))
    }
}

/// Source that records the highest number of overlapping fetches.
pub struct GaugeSource {
    key: &'static str,
    delay: Duration,
    records: Vec<RawPeriodRecord>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugeSource {
    pub fn new(key: &'static str, delay: Duration, records: Vec<RawPeriodRecord>) -> Self {
        Self {
            key,
            delay,
            records,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for GaugeSource {
    fn key(&self) -> SourceKey {
        SourceKey::new(self.key)
    }

    async fn fetch(
        &self,
        _symbol: &Symbol,
        _period_type: PeriodType,
        _since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}
