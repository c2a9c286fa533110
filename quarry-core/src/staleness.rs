use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use quarry_types::{CacheEntry, CanonicalFundamentals, RefreshPolicy};

/// Decide whether `entry` must be refreshed before being served at `now`.
///
/// An entry is stale when it has no canonical record, when it is older than its
/// effective interval (see [`effective_interval`]), or when a required metric is
/// missing or suspect and the eager retry budget (`retry_ceiling`) is not spent.
/// A confidently resolved zero never makes an entry stale.
#[must_use]
pub fn needs_refresh(entry: &CacheEntry, now: DateTime<Utc>, policy: &RefreshPolicy) -> bool {
    let Some(canonical) = entry.canonical.as_ref() else {
        #[cfg(feature = "tracing")]
        tracing::debug!(key = %entry.key, "no canonical record; refresh");
        return true;
    };
    let interval = TimeDelta::from_std(effective_interval(canonical, policy))
        .unwrap_or(TimeDelta::MAX);
    if now.signed_duration_since(entry.last_resolved_at) > interval {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            key = %entry.key,
            resolved_at = %entry.last_resolved_at,
            "refresh interval elapsed; refresh"
        );
        return true;
    }
    if is_complete(canonical, policy) {
        return false;
    }
    let eager = entry.eager_attempts() < policy.retry_ceiling;
    #[cfg(feature = "tracing")]
    tracing::debug!(
        key = %entry.key,
        attempts = entry.eager_attempts(),
        ceiling = policy.retry_ceiling,
        eager,
        "required metric missing or suspect"
    );
    eager
}

/// Smallest configured interval among the classes of the record's populated metrics.
///
/// Falls back to `default_interval` for a record with no populated metrics.
#[must_use]
pub fn effective_interval(canonical: &CanonicalFundamentals, policy: &RefreshPolicy) -> Duration {
    canonical
        .metrics
        .iter()
        .filter(|(_, v)| v.value.is_some())
        .map(|(k, _)| policy.interval_for(k.class()))
        .min()
        .unwrap_or(policy.default_interval)
}

/// True when every required metric has a value that is not a suspect zero.
#[must_use]
pub fn is_complete(canonical: &CanonicalFundamentals, policy: &RefreshPolicy) -> bool {
    policy
        .required_metrics
        .iter()
        .all(|&k| canonical.has_trusted(k))
}
