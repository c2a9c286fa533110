use async_trait::async_trait;
use chrono::NaiveDate;

use quarry_types::{PeriodType, QuarryError, RawPeriodRecord, SourceKey, Symbol};

/// One upstream fundamentals source behind a uniform fetch contract.
///
/// Implementations translate their provider's request options and response envelope
/// into [`RawPeriodRecord`]s, leaving `raw` in the provider's native shape. Field
/// normalization happens centrally in the resolver.
///
/// An empty vector means "this source has nothing for the symbol" and is not an
/// error. Errors should be reserved for failures: return a structural error (see
/// [`QuarryError::is_structural`]) only when calling any other source would fail the
/// same way.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier used in priority configuration and as `source_id`.
    fn key(&self) -> SourceKey;

    /// Fetch periods of `period_type` ending on or after `since`.
    async fn fetch(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError>;
}
