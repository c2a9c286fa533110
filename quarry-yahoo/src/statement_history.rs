//! Quote-summary statement history modules.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use quarry_core::{PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol};

use crate::client::{YahooClient, first_result};

/// `(module, list field)` pairs in merge precedence order: income statement fields win
/// over balance sheet and cash flow fields sharing a name.
const fn modules(period_type: PeriodType) -> [(&'static str, &'static str); 3] {
    match period_type {
        PeriodType::Quarterly => [
            ("incomeStatementHistoryQuarterly", "incomeStatementHistory"),
            ("balanceSheetHistoryQuarterly", "balanceSheetStatements"),
            ("cashflowStatementHistoryQuarterly", "cashflowStatements"),
        ],
        PeriodType::Annual => [
            ("incomeStatementHistory", "incomeStatementHistory"),
            ("balanceSheetHistory", "balanceSheetStatements"),
            ("cashflowStatementHistory", "cashflowStatements"),
        ],
    }
}

/// Source over `/v10/finance/quoteSummary/{symbol}` statement history modules.
///
/// The provider returns its most recent few periods; a module that is present but
/// holds an empty list contributes nothing.
pub struct StatementHistorySource {
    client: Arc<YahooClient>,
}

impl StatementHistorySource {
    /// Key used in priority configuration.
    pub const KEY: SourceKey = SourceKey::new("StatementHistory");

    /// Build on a shared client.
    #[must_use]
    pub const fn new(client: Arc<YahooClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for StatementHistorySource {
    fn key(&self) -> SourceKey {
        Self::KEY
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        since: NaiveDate,
    ) -> Result<Vec<RawPeriodRecord>, QuarryError> {
        if symbol.is_index() {
            return Ok(Vec::new());
        }
        let names = modules(period_type)
            .iter()
            .map(|(m, _)| *m)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/v10/finance/quoteSummary/{}", symbol.as_str());
        let body = match self
            .client
            .get_json(Self::KEY.as_str(), &path, &[("modules", names)])
            .await
        {
            Ok(body) => body,
            Err(QuarryError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        parse(&body, period_type, since)
    }
}

/// Merge the three statement lists into one record per `endDate`, newest first.
pub fn parse(
    body: &Value,
    period_type: PeriodType,
    since: NaiveDate,
) -> Result<Vec<RawPeriodRecord>, QuarryError> {
    let Some(result) = first_result(StatementHistorySource::KEY.as_str(), body, "quoteSummary")?
    else {
        return Ok(Vec::new());
    };

    let mut by_date: BTreeMap<NaiveDate, Map<String, Value>> = BTreeMap::new();
    for (module, list) in modules(period_type) {
        let Some(rows) = result
            .get(module)
            .and_then(|m| m.get(list))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for row in rows {
            let (Some(date), Some(fields)) = (end_date(row), row.as_object()) else {
                continue;
            };
            if date < since {
                continue;
            }
            let merged = by_date.entry(date).or_default();
            for (k, v) in fields {
                merged.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
    }

    Ok(by_date
        .into_iter()
        .rev()
        .map(|(date, fields)| RawPeriodRecord::new(date, period_type, Value::Object(fields)))
        .collect())
}

fn end_date(row: &Value) -> Option<NaiveDate> {
    let end = row.get("endDate")?;
    let secs = end.get("raw").unwrap_or(end).as_i64()?;
    DateTime::from_timestamp(secs, 0).map(|t| t.date_naive())
}
