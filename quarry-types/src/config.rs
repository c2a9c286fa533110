//! Configuration types shared by the engine and its middleware.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::{MetricClass, MetricKey};
use crate::source::SourceKey;

/// When cached fundamentals must be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    /// Interval used for metric classes without their own entry.
    pub default_interval: Duration,
    /// Per-class overrides. A record refreshes at the smallest interval among the
    /// classes of its populated metrics.
    pub per_class: BTreeMap<MetricClass, Duration>,
    /// Eager retries allowed for missing or suspect required metrics before they are
    /// treated as confirmed missing.
    pub retry_ceiling: u32,
    /// Metrics whose absence (or suspect zero) makes a record eligible for eager retry.
    pub required_metrics: Vec<MetricKey>,
}

impl RefreshPolicy {
    /// Interval configured for one metric class.
    #[must_use]
    pub fn interval_for(&self, class: MetricClass) -> Duration {
        self.per_class
            .get(&class)
            .copied()
            .unwrap_or(self.default_interval)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(24 * 60 * 60),
            per_class: BTreeMap::new(),
            retry_ceiling: 3,
            required_metrics: vec![
                MetricKey::TotalRevenue,
                MetricKey::NetIncome,
                MetricKey::OperatingIncome,
                MetricKey::TotalAssets,
                MetricKey::TotalStockholderEquity,
            ],
        }
    }
}

/// Global configuration for the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Staleness rules.
    pub refresh: RefreshPolicy,
    /// Timeout for each individual source call.
    pub provider_timeout: Duration,
    /// Timeout for each cache store call.
    pub store_timeout: Duration,
    /// Maximum number of refreshes running at once; extra requests queue.
    pub max_concurrency: usize,
    /// Source priority order. Sources not listed follow in registration order;
    /// listed keys with no registered source are ignored.
    pub source_priority: Vec<SourceKey>,
    /// How far back sources are asked to look for periods.
    pub lookback: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshPolicy::default(),
            provider_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(2),
            max_concurrency: 4,
            source_priority: Vec::new(),
            lookback: Duration::from_secs(730 * 24 * 60 * 60),
        }
    }
}

/// Fixed-window call budget for a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum calls within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60),
        }
    }
}

/// Snapshot of a quota budget at a point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Configured maximum calls per window.
    pub limit: u64,
    /// Remaining calls in the current window.
    pub remaining: u64,
    /// Time until the current window resets.
    pub reset_in: Duration,
}
