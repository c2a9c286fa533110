//! Quarry data transfer objects, configuration primitives and error taxonomy.
#![warn(missing_docs)]

mod config;
mod error;
mod fundamentals;
mod metrics;
mod reports;
mod source;
mod symbol;

pub use config::{EngineConfig, QuotaConfig, QuotaState, RefreshPolicy};
pub use error::QuarryError;
pub use fundamentals::{
    CacheEntry, CanonicalFundamentals, EntryKey, NotAvailable, RawPeriodRecord, Resolution,
};
pub use metrics::{MetricClass, MetricKey, MetricValue, PeriodType};
pub use reports::{BatchReport, SymbolOutcome};
pub use source::SourceKey;
pub use symbol::Symbol;
