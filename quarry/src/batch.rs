use futures::future::join_all;

use quarry_core::{BatchReport, PeriodType, SymbolOutcome};

use crate::Engine;

impl Engine {
    /// Resolve many symbols concurrently.
    ///
    /// Each symbol is independent: an invalid symbol or a structural failure lands
    /// in its own outcome without affecting the others. Outcomes keep input order.
    /// Upstream concurrency is still bounded by `max_concurrency`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quarry::resolve_many",
            skip(self, symbols),
            fields(period = %period_type),
        )
    )]
    pub async fn resolve_many<I, S>(&self, symbols: I, period_type: PeriodType) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inputs: Vec<String> = symbols.into_iter().map(|s| s.as_ref().to_string()).collect();
        let results = join_all(
            inputs
                .iter()
                .map(|s| self.resolve_fundamentals(s, period_type)),
        )
        .await;
        let outcomes: Vec<SymbolOutcome> = inputs
            .into_iter()
            .zip(results)
            .map(|(input, result)| SymbolOutcome { input, result })
            .collect();
        #[cfg(feature = "tracing")]
        tracing::info!(
            total = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
            "batch resolved"
        );
        BatchReport { outcomes }
    }
}
