//! Quarry resolves company fundamentals across several upstream sources.
//!
//! Overview
//! - Sources implement [`SourceAdapter`] and are tried in priority order. The first
//!   one returning a record for the requested period type wins; empty responses,
//!   transient failures and timeouts fall through to the next source.
//! - Structural failures (bad symbol, rejected credentials) abort immediately.
//! - Resolved records are written to a [`CacheStore`]. A staleness policy decides
//!   when a cached record must be refreshed, including eager retries while required
//!   metrics are missing or suspect.
//! - Concurrent requests for the same symbol and period share one resolution, and a
//!   semaphore bounds how many resolutions hit upstream sources at once.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quarry::{Engine, PeriodType};
//! use quarry_yahoo::{Yahoo, YahooConfig};
//!
//! let yahoo = Yahoo::new(&YahooConfig::default())?;
//! let engine = Engine::builder()
//!     .with_sources(yahoo.sources())
//!     .refresh_interval(Duration::from_secs(6 * 3600))
//!     .max_concurrency(4)
//!     .build()?;
//!
//! let res = engine.resolve_fundamentals("RELIANCE", PeriodType::Quarterly).await?;
//! if let Some(f) = res.fundamentals() {
//!     println!("{} from {}", f.period_end_date, f.source_id);
//! }
//! ```
#![warn(missing_docs)]

mod batch;
mod core;
mod flight;
mod resolver;

pub use crate::core::{Engine, EngineBuilder};

pub use quarry_core::{
    BatchReport, CacheEntry, CacheStore, CanonicalFundamentals, EngineConfig, EntryKey,
    MetricClass, MetricKey, MetricValue, NotAvailable, PeriodType, QuarryError, QuotaConfig,
    RawPeriodRecord, RefreshPolicy, Resolution, SourceAdapter, SourceKey, Symbol,
    SymbolOutcome,
};
pub use quarry_middleware::{MemoryStore, SourceBuilder};
