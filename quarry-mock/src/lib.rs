//! Scripted source adapters and fixture payloads for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use quarry_core::{
    PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol,
};

pub mod fixtures;

/// Instruction for how a fetch should behave.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return these records (the mock does not filter them).
    Return(Vec<RawPeriodRecord>),
    /// Fail immediately with the provided error.
    Fail(QuarryError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

/// One observed `fetch` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchCall {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Requested cadence.
    pub period_type: PeriodType,
    /// Lower bound on period end dates.
    pub since: NaiveDate,
}

/// Source adapter with scripted behavior and call accounting.
///
/// Per-symbol rules take precedence over the default behavior.
pub struct MockSource {
    key: SourceKey,
    delay: Duration,
    default: Mutex<MockBehavior>,
    rules: Mutex<HashMap<Symbol, MockBehavior>>,
    calls: AtomicUsize,
    log: Mutex<Vec<FetchCall>>,
}

impl MockSource {
    /// Source that returns no records.
    #[must_use]
    pub fn empty(key: &'static str) -> Self {
        Self::with_behavior(key, MockBehavior::Return(Vec::new()))
    }

    /// Source that returns `records` for every symbol.
    #[must_use]
    pub fn returning(key: &'static str, records: Vec<RawPeriodRecord>) -> Self {
        Self::with_behavior(key, MockBehavior::Return(records))
    }

    /// Source that fails every call with `err`.
    #[must_use]
    pub fn failing(key: &'static str, err: QuarryError) -> Self {
        Self::with_behavior(key, MockBehavior::Fail(err))
    }

    /// Source whose calls never complete.
    #[must_use]
    pub fn hanging(key: &'static str) -> Self {
        Self::with_behavior(key, MockBehavior::Hang)
    }

    /// Source with an explicit default behavior.
    #[must_use]
    pub fn with_behavior(key: &'static str, behavior: MockBehavior) -> Self {
        Self {
            key: SourceKey::new(key),
            delay: Duration::ZERO,
            default: Mutex::new(behavior),
            rules: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Sleep for `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the default behavior.
    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.default.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Script the behavior for one symbol.
    pub fn set_rule(&self, symbol: Symbol, behavior: MockBehavior) {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol, behavior);
    }

    /// Number of `fetch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every `fetch` call so far, in arrival order.
    pub fn requests(&self) -> Vec<FetchCall> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn behavior_for(&self, symbol: &Symbol) -> MockBehavior {
        if let Some(rule) = self
            .rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
        {
            return rule.clone();
        }
        self.default
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn key(&self) -> SourceKey {
        self.key.clone()
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FetchCall {
                symbol: symbol.clone(),
                period_type,
                since,
            });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.behavior_for(symbol) {
            MockBehavior::Return(records) => Ok(records),
            MockBehavior::Fail(err) => Err(err),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}
