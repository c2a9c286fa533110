use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use quarry_core::{
    Middleware, PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol,
};

/// Source wrapper that stops calling its inner source for a while after it reports
/// throttling (`RateLimited` or `QuotaExceeded`).
pub struct BlacklistingSource {
    inner: Arc<dyn SourceAdapter>,
    state: Mutex<Option<Instant>>, // blacklisted until; None means active
    default_duration: Duration,
}

impl BlacklistingSource {
    /// Wrap `inner`; `default_duration` applies when the error carries no reset hint.
    pub fn new(inner: Arc<dyn SourceAdapter>, default_duration: Duration) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
            default_duration,
        }
    }

    fn remaining_block(&self) -> Option<Duration> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match *guard {
            Some(until) if now < until => Some(until - now),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    fn handle_error(&self, err: QuarryError) -> QuarryError {
        let hint_ms = match &err {
            QuarryError::QuotaExceeded { reset_in_ms, .. } => Some(*reset_in_ms),
            QuarryError::RateLimited { retry_after_ms, .. } => Some(retry_after_ms.unwrap_or(0)),
            _ => None,
        };
        if let Some(ms) = hint_ms {
            let duration = if ms > 0 {
                Duration::from_millis(ms)
            } else {
                self.default_duration
            };
            #[cfg(feature = "tracing")]
            tracing::warn!(
                source = %self.inner.key(),
                blocked_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "source throttled; blacklisting"
            );
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *guard = Some(Instant::now() + duration);
        }
        err
    }
}

#[async_trait]
impl SourceAdapter for BlacklistingSource {
    fn key(&self) -> SourceKey {
        self.inner.key()
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError> {
        if let Some(left) = self.remaining_block() {
            return Err(QuarryError::TemporarilyBlacklisted {
                reset_in_ms: left.as_millis().try_into().unwrap_or(u64::MAX),
            });
        }
        self.inner
            .fetch(symbol, period_type, since)
            .await
            .map_err(|e| self.handle_error(e))
    }
}

/// Middleware config for constructing a [`BlacklistingSource`].
pub struct BlacklistMiddleware {
    default_duration: Duration,
}

impl BlacklistMiddleware {
    /// Create the middleware with the fallback blacklist duration.
    #[must_use]
    pub const fn new(default_duration: Duration) -> Self {
        Self { default_duration }
    }
}

impl Middleware for BlacklistMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn SourceAdapter>) -> Arc<dyn SourceAdapter> {
        Arc::new(BlacklistingSource::new(inner, self.default_duration))
    }

    fn name(&self) -> &'static str {
        "BlacklistingSource"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({ "default_duration_ms": self.default_duration.as_millis() })
    }
}
