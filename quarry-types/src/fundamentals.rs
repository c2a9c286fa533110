//! Canonical fundamentals records, raw provider records and cache entries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricKey, MetricValue, PeriodType};
use crate::source::SourceKey;
use crate::symbol::Symbol;

/// Normalized, provider-independent fundamentals for one symbol and one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFundamentals {
    /// Exchange-qualified ticker.
    pub symbol: Symbol,
    /// End of the fiscal period represented.
    pub period_end_date: NaiveDate,
    /// Reporting cadence.
    pub period_type: PeriodType,
    /// One entry per [`MetricKey`]; missing metrics are present with `value: None`.
    pub metrics: BTreeMap<MetricKey, MetricValue>,
    /// Source adapter that produced the record.
    pub source_id: SourceKey,
    /// When the record was resolved.
    pub resolved_at: DateTime<Utc>,
}

impl CanonicalFundamentals {
    /// Look up one metric; absent keys read as [`MetricValue::MISSING`].
    #[must_use]
    pub fn metric(&self, key: MetricKey) -> MetricValue {
        self.metrics.get(&key).copied().unwrap_or(MetricValue::MISSING)
    }

    /// True when `key` has a value that is not a suspect zero.
    #[must_use]
    pub fn has_trusted(&self, key: MetricKey) -> bool {
        self.metric(key).is_trusted()
    }
}

/// One reporting period in a source's native payload shape.
///
/// Adapters never normalize `raw`; the resolver extracts metrics from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriodRecord {
    /// End of the fiscal period.
    pub period_end_date: NaiveDate,
    /// Cadence the source reported this period under.
    pub period_type: PeriodType,
    /// Provider-native object.
    pub raw: serde_json::Value,
}

impl RawPeriodRecord {
    /// Build a record from its parts.
    #[must_use]
    pub const fn new(
        period_end_date: NaiveDate,
        period_type: PeriodType,
        raw: serde_json::Value,
    ) -> Self {
        Self {
            period_end_date,
            period_type,
            raw,
        }
    }
}

/// Key of one cache row: quarterly and annual records are tracked independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryKey {
    /// Exchange-qualified ticker.
    pub symbol: Symbol,
    /// Reporting cadence.
    pub period_type: PeriodType,
}

impl EntryKey {
    /// Build a key.
    #[must_use]
    pub const fn new(symbol: Symbol, period_type: PeriodType) -> Self {
        Self {
            symbol,
            period_type,
        }
    }
}

impl core::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.symbol, self.period_type)
    }
}

/// Cached resolution state for one [`EntryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Row key.
    pub key: EntryKey,
    /// Time of the most recent resolution attempt.
    pub last_resolved_at: DateTime<Utc>,
    /// Latest successfully resolved record.
    pub canonical: Option<CanonicalFundamentals>,
    /// Attempts in a row that exhausted every source; reset on success.
    pub consecutive_failures: u32,
    /// Successful resolutions in a row that still lacked a required metric; reset when
    /// a resolution is complete.
    #[serde(default)]
    pub incomplete_refreshes: u32,
}

impl CacheEntry {
    /// Entry for a key that has never been resolved.
    #[must_use]
    pub const fn empty(key: EntryKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            last_resolved_at: now,
            canonical: None,
            consecutive_failures: 0,
            incomplete_refreshes: 0,
        }
    }

    /// Attempts spent on eager retries so far.
    #[must_use]
    pub const fn eager_attempts(&self) -> u32 {
        self.consecutive_failures
            .saturating_add(self.incomplete_refreshes)
    }
}

/// Outcome of a fundamentals request that did not fail structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// A canonical record is available (fresh from cache or newly resolved).
    Resolved(CanonicalFundamentals),
    /// Every source came back empty.
    NotAvailable(NotAvailable),
}

impl Resolution {
    /// The canonical record, if resolved.
    #[must_use]
    pub const fn fundamentals(&self) -> Option<&CanonicalFundamentals> {
        match self {
            Self::Resolved(f) => Some(f),
            Self::NotAvailable(_) => None,
        }
    }

    /// True for [`Resolution::Resolved`].
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Details of an exhausted resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotAvailable {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Requested cadence.
    pub period_type: PeriodType,
    /// Failure counter after this attempt.
    pub consecutive_failures: u32,
    /// Previously stored record, if any, for callers that can serve stale data.
    pub last_known: Option<CanonicalFundamentals>,
}
