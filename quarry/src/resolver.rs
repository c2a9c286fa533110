//! Fallback Resolver.
//!
//! Walks the ordered source list as a small state machine:
//!
//! ```text
//! Trying(0) --records--> Resolved
//!     |
//!   empty / transient failure / timeout
//!     v
//! Trying(1) --records--> Resolved
//!     |
//!     v
//!    ...      past the last source --> Exhausted
//! ```
//!
//! A structural error from any source aborts the walk immediately.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use quarry_core::{
    CanonicalFundamentals, PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, Symbol,
    canonicalize,
};

use crate::core::source_call_with_timeout;

/// Resolver states. `Resolved` and `Exhausted` are terminal.
#[derive(Debug)]
enum State {
    Trying(usize),
    Resolved(CanonicalFundamentals),
    Exhausted,
}

/// Inputs of one resolution walk.
pub(crate) struct Walk<'a> {
    pub sources: &'a [Arc<dyn SourceAdapter>],
    pub symbol: &'a Symbol,
    pub period_type: PeriodType,
    pub since: NaiveDate,
    pub timeout: Duration,
    pub now: DateTime<Utc>,
}

impl Walk<'_> {
    /// Run the state machine to a terminal state.
    ///
    /// Returns `Ok(None)` when every source came back empty.
    ///
    /// # Errors
    /// Propagates the first structural error raised by a source.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quarry::resolver::run",
            skip(self),
            fields(symbol = %self.symbol, period = %self.period_type, sources = self.sources.len()),
        )
    )]
    pub(crate) async fn run(self) -> Result<Option<CanonicalFundamentals>, QuarryError> {
        let mut state = State::Trying(0);
        loop {
            state = match state {
                State::Trying(i) => self.step(i).await?,
                State::Resolved(canonical) => return Ok(Some(canonical)),
                State::Exhausted => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(symbol = %self.symbol, "all sources exhausted");
                    return Ok(None);
                }
            };
        }
    }

    async fn step(&self, i: usize) -> Result<State, QuarryError> {
        let Some(source) = self.sources.get(i) else {
            return Ok(State::Exhausted);
        };
        let records = source_call_with_timeout(
            source.as_ref(),
            self.symbol,
            self.period_type,
            self.since,
            self.timeout,
        )
        .await?;
        match latest(&records, self.period_type) {
            Some(record) => Ok(State::Resolved(canonicalize(
                self.symbol,
                record,
                source.key(),
                self.now,
            ))),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    source = %source.key(),
                    symbol = %self.symbol,
                    "no usable records; falling through"
                );
                Ok(State::Trying(i + 1))
            }
        }
    }
}

/// Most recent record of the requested cadence. The first record wins a tie.
pub(crate) fn latest(
    records: &[RawPeriodRecord],
    period_type: PeriodType,
) -> Option<&RawPeriodRecord> {
    records
        .iter()
        .filter(|r| r.period_type == period_type)
        .fold(None, |best: Option<&RawPeriodRecord>, r| match best {
            Some(b) if b.period_end_date >= r.period_end_date => Some(b),
            _ => Some(r),
        })
}
