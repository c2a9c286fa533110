//! Quota-aware source wrapper.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use quarry_core::{
    Middleware, PeriodType, QuarryError, QuotaConfig, QuotaState, RawPeriodRecord, SourceAdapter,
    SourceKey, Symbol,
};

/// Wrapper that enforces a fixed-window call budget on its inner source.
pub struct QuotaAwareSource {
    inner: Arc<dyn SourceAdapter>,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    limit: u64,
    window: Duration,
    calls_made_in_window: u64,
    last_reset: Instant,
}

impl QuotaRuntime {
    fn roll_window(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_reset);
        if elapsed < self.window {
            return;
        }
        self.calls_made_in_window = 0;
        // Advance by whole windows so boundaries stay aligned across idle gaps.
        let windows_passed = elapsed.as_nanos() / self.window.as_nanos().max(1);
        let offset = Duration::from_nanos(
            (windows_passed * self.window.as_nanos())
                .try_into()
                .unwrap_or(u64::MAX),
        );
        self.last_reset += offset;
    }

    fn reset_in(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.duration_since(self.last_reset))
    }
}

impl QuotaAwareSource {
    /// Create a new quota-aware wrapper around an existing source.
    pub fn new(inner: Arc<dyn SourceAdapter>, config: QuotaConfig) -> Self {
        Self {
            inner,
            runtime: Mutex::new(QuotaRuntime {
                limit: config.limit,
                window: config.window,
                calls_made_in_window: 0,
                last_reset: Instant::now(),
            }),
        }
    }

    /// Access the inner source.
    pub fn inner(&self) -> &Arc<dyn SourceAdapter> {
        &self.inner
    }

    /// Consume one unit of budget if available.
    ///
    /// # Errors
    /// Returns `QuarryError::QuotaExceeded` when the current window is exhausted.
    pub fn should_allow_call(&self) -> Result<(), QuarryError> {
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        rt.roll_window(now);
        if rt.calls_made_in_window < rt.limit {
            rt.calls_made_in_window += 1;
            return Ok(());
        }
        Err(QuarryError::QuotaExceeded {
            remaining: 0,
            reset_in_ms: rt.reset_in(now).as_millis().try_into().unwrap_or(u64::MAX),
        })
    }

    /// Snapshot of the current budget.
    pub fn state(&self) -> QuotaState {
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        rt.roll_window(now);
        QuotaState {
            limit: rt.limit,
            remaining: rt.limit.saturating_sub(rt.calls_made_in_window),
            reset_in: rt.reset_in(now),
        }
    }
}

#[async_trait]
impl SourceAdapter for QuotaAwareSource {
    fn key(&self) -> SourceKey {
        self.inner.key()
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError> {
        self.should_allow_call()?;
        self.inner.fetch(symbol, period_type, since).await
    }
}

/// Middleware config for constructing a [`QuotaAwareSource`].
pub struct QuotaMiddleware {
    /// Budget applied to the wrapped source.
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Create the middleware from a quota budget.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn SourceAdapter>) -> Arc<dyn SourceAdapter> {
        Arc::new(QuotaAwareSource::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaAwareSource"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": self.config.window.as_millis(),
        })
    }
}
