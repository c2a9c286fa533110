//! Provider-shaped record builders.
//!
//! Values are wrapped the way the quote-summary endpoints wrap them
//! (`{"raw": 2500000, "fmt": "2.5M"}`) unless noted otherwise.

use chrono::NaiveDate;
use quarry_core::{PeriodType, RawPeriodRecord, Symbol};
use serde_json::{Map, Value, json};

/// Calendar date from components; panics on invalid input (test helper).
#[must_use]
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("invalid fixture date {y}-{m}-{d}"))
}

/// Parse a canonical symbol; panics on invalid input (test helper).
#[must_use]
pub fn sym(s: &str) -> Symbol {
    Symbol::parse(s).unwrap_or_else(|e| panic!("invalid fixture symbol: {e}"))
}

/// `{"raw": v, "fmt": ...}` wrapper.
#[must_use]
pub fn wrapped(v: i64) -> Value {
    json!({ "raw": v, "fmt": format!("{v}") })
}

/// Statement-history row with the given `camelCase` fields.
#[must_use]
pub fn statement_record(
    end: NaiveDate,
    period_type: PeriodType,
    fields: &[(&str, i64)],
) -> RawPeriodRecord {
    let mut raw = Map::new();
    let epoch = end
        .and_hms_opt(0, 0, 0)
        .map_or(0, |t| t.and_utc().timestamp());
    raw.insert(
        "endDate".to_string(),
        json!({ "raw": epoch, "fmt": end.to_string() }),
    );
    for (name, v) in fields {
        raw.insert((*name).to_string(), wrapped(*v));
    }
    RawPeriodRecord::new(end, period_type, Value::Object(raw))
}

/// Time-series row with the given `PascalCase` type names.
#[must_use]
pub fn timeseries_record(
    end: NaiveDate,
    period_type: PeriodType,
    fields: &[(&str, i64)],
) -> RawPeriodRecord {
    let mut raw = Map::new();
    raw.insert("asOfDate".to_string(), json!(end.to_string()));
    for (name, v) in fields {
        raw.insert((*name).to_string(), wrapped(*v));
    }
    RawPeriodRecord::new(end, period_type, Value::Object(raw))
}

/// Earnings-chart quarter carrying only revenue and earnings.
#[must_use]
pub fn earnings_record(end: NaiveDate, revenue: i64, earnings: i64) -> RawPeriodRecord {
    RawPeriodRecord::new(
        end,
        PeriodType::Quarterly,
        json!({ "revenue": wrapped(revenue), "earnings": wrapped(earnings) }),
    )
}

/// Quarterly statement row in which every default required metric is populated.
#[must_use]
pub fn complete_statement(end: NaiveDate, revenue: i64) -> RawPeriodRecord {
    statement_record(
        end,
        PeriodType::Quarterly,
        &[
            ("totalRevenue", revenue),
            ("costOfRevenue", revenue / 2),
            ("operatingIncome", revenue / 5),
            ("netIncome", revenue / 10),
            ("totalAssets", revenue * 4),
            ("totalStockholderEquity", revenue * 2),
        ],
    )
}
