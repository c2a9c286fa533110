//! quarry-yahoo
//!
//! The three Yahoo Finance fundamentals sources, richest to leanest:
//!
//! - [`TimeSeriesSource`]: consolidated multi-metric time series.
//! - [`StatementHistorySource`]: quote-summary statement history modules.
//! - [`EarningsChartSource`]: quote-summary earnings chart (revenue and earnings only).
//!
//! All three share one immutable [`YahooClient`]. Index symbols carry no financial
//! statements, so every source answers them with zero records without a request.
#![warn(missing_docs)]

mod client;
mod config;
/// Earnings chart source and label parsing.
pub mod earnings_chart;
/// Statement history source.
pub mod statement_history;
/// Time-series source.
pub mod timeseries;

use std::sync::Arc;
use std::time::Duration;

use quarry_core::{QuarryError, QuotaConfig, SourceAdapter};
use quarry_middleware::SourceBuilder;

pub use client::YahooClient;
pub use config::YahooConfig;
pub use earnings_chart::EarningsChartSource;
pub use statement_history::StatementHistorySource;
pub use timeseries::TimeSeriesSource;

/// Constructor for the Yahoo source set.
pub struct Yahoo {
    client: Arc<YahooClient>,
}

impl Yahoo {
    /// Build the shared client.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration cannot produce an HTTP client.
    pub fn new(config: &YahooConfig) -> Result<Self, QuarryError> {
        Ok(Self {
            client: Arc::new(YahooClient::new(config)?),
        })
    }

    /// The three sources in default priority order, unwrapped.
    #[must_use]
    pub fn sources(&self) -> Vec<Arc<dyn SourceAdapter>> {
        vec![
            Arc::new(TimeSeriesSource::new(Arc::clone(&self.client))),
            Arc::new(StatementHistorySource::new(Arc::clone(&self.client))),
            Arc::new(EarningsChartSource::new(Arc::clone(&self.client))),
        ]
    }

    /// The three sources, each behind its own quota and blacklist layers.
    ///
    /// `per_source` bounds each endpoint independently; a throttled source is
    /// skipped for `blacklist_for` (or the provider's retry hint) while the others
    /// keep serving.
    #[must_use]
    pub fn rate_limited(
        &self,
        per_source: QuotaConfig,
        blacklist_for: Duration,
    ) -> Vec<Arc<dyn SourceAdapter>> {
        self.sources()
            .into_iter()
            .map(|raw| {
                SourceBuilder::new(raw)
                    .with_quota(per_source)
                    .with_blacklist(blacklist_for)
                    .build()
            })
            .collect()
    }
}
