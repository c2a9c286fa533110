//! Quote-summary `earnings` module: the lean last-resort source.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};

use quarry_core::{PeriodType, QuarryError, RawPeriodRecord, SourceAdapter, SourceKey, Symbol};

use crate::client::{YahooClient, first_result};

/// Source over the `earnings` quote-summary module.
///
/// Yields `revenue` and `earnings` per period plus `epsActual` for quarters the
/// earnings chart covers. Nothing else is available here.
pub struct EarningsChartSource {
    client: Arc<YahooClient>,
}

impl EarningsChartSource {
    /// Key used in priority configuration.
    pub const KEY: SourceKey = SourceKey::new("EarningsChart");

    /// Build on a shared client.
    #[must_use]
    pub const fn new(client: Arc<YahooClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for EarningsChartSource {
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
        let path = format!("/v10/finance/quoteSummary/{}", symbol.as_str());
        let body = match self
            .client
            .get_json(Self::KEY.as_str(), &path, &[("modules", "earnings".to_string())])
            .await
        {
            Ok(body) => body,
            Err(QuarryError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        parse(&body, period_type, since)
    }
}

/// Turn the financials chart into records, newest first.
pub fn parse(
    body: &Value,
    period_type: PeriodType,
    since: NaiveDate,
) -> Result<Vec<RawPeriodRecord>, QuarryError> {
    let Some(result) = first_result(EarningsChartSource::KEY.as_str(), body, "quoteSummary")?
    else {
        return Ok(Vec::new());
    };
    let Some(earnings) = result.get("earnings") else {
        return Ok(Vec::new());
    };
    let series = match period_type {
        PeriodType::Quarterly => "quarterly",
        PeriodType::Annual => "yearly",
    };
    let rows = earnings
        .pointer(&format!("/financialsChart/{series}"))
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    let eps_rows = earnings
        .pointer("/earningsChart/quarterly")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let mut records: Vec<RawPeriodRecord> = rows
        .iter()
        .filter_map(|row| {
            let label = row.get("date")?;
            let chart_row = match period_type {
                PeriodType::Quarterly => eps_rows.iter().find(|e| e.get("date") == Some(label)),
                PeriodType::Annual => None,
            };
            let end = chart_row
                .and_then(chart_period_end)
                .or_else(|| period_end(label))?;
            if end < since {
                return None;
            }
            let mut raw = json!({
                "date": label.clone(),
                "revenue": row.get("revenue").cloned().unwrap_or(Value::Null),
                "earnings": row.get("earnings").cloned().unwrap_or(Value::Null),
            });
            let eps = chart_row.and_then(|e| e.get("actual"));
            if let (Some(eps), Some(obj)) = (eps, raw.as_object_mut()) {
                obj.insert("epsActual".to_string(), eps.clone());
            }
            Some(RawPeriodRecord::new(end, period_type, raw))
        })
        .collect();
    records.sort_by(|a, b| b.period_end_date.cmp(&a.period_end_date));
    Ok(records)
}

/// Period end stated by an earnings chart row, when it carries one.
///
/// Rows for issuers whose fiscal year is not the calendar year (Indian issuers close
/// it on March 31) may label quarters by fiscal quarter. Their `periodEndDate`
/// (epoch seconds or ISO date) or `calendarQuarter` label is then authoritative.
fn chart_period_end(row: &Value) -> Option<NaiveDate> {
    if let Some(v) = row.get("periodEndDate") {
        let v = v.get("raw").unwrap_or(v);
        if let Some(secs) = v.as_i64() {
            return chrono::DateTime::from_timestamp(secs, 0).map(|t| t.date_naive());
        }
        if let Some(date) = v.as_str().and_then(|s| s.get(..10)?.parse().ok()) {
            return Some(date);
        }
    }
    row.get("calendarQuarter").and_then(period_end)
}

/// Map a chart label to the last day of its period.
///
/// Quarter labels look like `2Q2024` and are read as calendar quarters (quarter 2 of
/// 2024 ends June 30). A fiscal-quarter label would land one or more quarters off,
/// so [`parse`] prefers the dates an earnings chart row states. Yearly labels are a
/// bare year, as a number or a string, and end December 31.
#[must_use]
pub fn period_end(label: &Value) -> Option<NaiveDate> {
    if let Some(year) = label.as_i64() {
        return NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 12, 31);
    }
    let s = label.as_str()?.trim();
    if let Some((q, year)) = s.split_once('Q') {
        let q: u32 = q.parse().ok().filter(|q| (1..=4).contains(q))?;
        let year: i32 = year.parse().ok()?;
        return quarter_end(year, q);
    }
    NaiveDate::from_ymd_opt(s.parse().ok()?, 12, 31)
}

fn quarter_end(year: i32, quarter: u32) -> Option<NaiveDate> {
    if quarter == 4 {
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    NaiveDate::from_ymd_opt(year, quarter * 3 + 1, 1)?.pred_opt()
}
