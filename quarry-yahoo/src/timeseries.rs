//! Consolidated multi-metric time-series endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{Map, Value};

use quarry_core::{PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol};

use crate::client::{YahooClient, first_result};

/// Line items requested from the time-series endpoint, without the cadence prefix.
pub const TYPES: &[&str] = &[
    "TotalRevenue",
    "OperatingRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingIncome",
    "EBIT",
    "PretaxIncome",
    "InterestExpense",
    "TaxProvision",
    "NetIncome",
    "NetIncomeCommonStockholders",
    "BasicEPS",
    "DilutedEPS",
    "TotalAssets",
    "CurrentAssets",
    "CurrentLiabilities",
    "StockholdersEquity",
    "TotalLiabilitiesNetMinorityInterest",
    "CashAndCashEquivalents",
    "Inventory",
    "OperatingCashFlow",
    "CapitalExpenditure",
    "FreeCashFlow",
];

const fn prefix(period_type: PeriodType) -> &'static str {
    match period_type {
        PeriodType::Quarterly => "quarterly",
        PeriodType::Annual => "annual",
    }
}

/// Source over `/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}`.
///
/// Symbols the provider has not indexed come back as a result list whose series
/// are all empty; that yields zero records.
pub struct TimeSeriesSource {
    client: Arc<YahooClient>,
}

impl TimeSeriesSource {
    /// Key used in priority configuration.
    pub const KEY: SourceKey = SourceKey::new("TimeSeries");

    /// Build on a shared client.
    #[must_use]
    pub const fn new(client: Arc<YahooClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for TimeSeriesSource {
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
        let types = TYPES
            .iter()
            .map(|t| format!("{}{t}", prefix(period_type)))
            .collect::<Vec<_>>()
            .join(",");
        let period1 = since.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = Utc::now().timestamp();
        let query = [
            ("symbol", symbol.as_str().to_string()),
            ("type", types),
            ("merge", "false".to_string()),
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
        ];
        let path = format!(
            "/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            symbol.as_str()
        );
        let body = match self.client.get_json(Self::KEY.as_str(), &path, &query).await {
            Ok(body) => body,
            Err(QuarryError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        parse(&body, period_type, since)
    }
}

/// Pivot the per-line-item series into one record per `asOfDate`.
///
/// Each record's `raw` maps the unprefixed line name (`TotalRevenue`) to the
/// provider's `reportedValue` wrapper and carries the `asOfDate` string.
pub fn parse(
    body: &Value,
    period_type: PeriodType,
    since: NaiveDate,
) -> Result<Vec<RawPeriodRecord>, QuarryError> {
    let source = TimeSeriesSource::KEY;
    let Some(timeseries) = body.get("timeseries") else {
        return Err(QuarryError::Data(format!("{source}: missing `timeseries`")));
    };
    if first_result(source.as_str(), body, "timeseries")?.is_none() {
        return Ok(Vec::new());
    }
    let results = timeseries
        .get("result")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let prefix = prefix(period_type);
    let mut by_date: BTreeMap<NaiveDate, Map<String, Value>> = BTreeMap::new();
    for series in results {
        let Some(type_name) = series
            .pointer("/meta/type/0")
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(field) = type_name.strip_prefix(prefix) else {
            continue;
        };
        let Some(points) = series.get(type_name).and_then(Value::as_array) else {
            continue;
        };
        for point in points {
            let Some(date) = point
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let Some(value) = point.get("reportedValue") else {
                continue;
            };
            if date < since {
                continue;
            }
            by_date
                .entry(date)
                .or_default()
                .insert(field.to_string(), value.clone());
        }
    }

    Ok(by_date
        .into_iter()
        .rev()
        .map(|(date, mut fields)| {
            fields.insert("asOfDate".to_string(), Value::String(date.to_string()));
            RawPeriodRecord::new(date, period_type, Value::Object(fields))
        })
        .collect())
}
