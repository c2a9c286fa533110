//! Field Extractor.
//!
//! Provider payloads name the same financial line differently across endpoints and
//! schema versions (`totalRevenue`, `TotalRevenue`, `revenue`, ...) and often wrap
//! numbers as `{"raw": 2500000, "fmt": "2.5M"}`. [`candidate_keys`] is the explicit,
//! ordered table of accepted names per metric; [`extract`] walks it.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use quarry_types::{MetricKey, MetricValue};

/// Extract one field from `raw` using an ordered list of candidate key paths.
///
/// Candidate paths may be dotted (`earnings.actual`) to reach into nested objects.
/// The first candidate whose path is present wins, even when its value is `null`;
/// later candidates are not consulted. The winning value may be a bare number or a
/// wrapper object exposing a numeric `raw` field, in which case the formatted string
/// is ignored. Anything else (strings, booleans, arrays, wrappers without a numeric
/// `raw`) yields a missing value.
///
/// A value of exactly zero is returned with `suspect: true`. Absence is never suspect.
#[must_use]
pub fn extract(raw: &Value, candidates: &[&str]) -> MetricValue {
    candidates
        .iter()
        .find_map(|path| lookup(raw, path))
        .map_or(MetricValue::MISSING, |v| MetricValue::tagged(unwrap_numeric(v)))
}

fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(raw, |node, segment| node.as_object()?.get(segment))
}

fn unwrap_numeric(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => number_to_decimal(n),
        Value::Object(map) => match map.get("raw") {
            Some(Value::Number(n)) => number_to_decimal(n),
            _ => None,
        },
        _ => None,
    }
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    n.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
}

/// Ordered candidate key paths for one metric across every supported source schema.
///
/// Statement-history names come first, then time-series names, then the lean
/// earnings-chart names; within a schema the more specific line precedes its
/// broader synonym.
#[must_use]
pub const fn candidate_keys(key: MetricKey) -> &'static [&'static str] {
    match key {
        MetricKey::TotalRevenue => &[
            "totalRevenue",
            "TotalRevenue",
            "OperatingRevenue",
            "revenue",
        ],
        MetricKey::CostOfRevenue => &[
            "costOfRevenue",
            "CostOfRevenue",
            "ReconciledCostOfRevenue",
        ],
        MetricKey::GrossProfit => &["grossProfit", "GrossProfit"],
        MetricKey::OperatingIncome => &[
            "operatingIncome",
            "OperatingIncome",
            "TotalOperatingIncomeAsReported",
        ],
        MetricKey::Ebit => &["ebit", "EBIT"],
        MetricKey::IncomeBeforeTax => &["incomeBeforeTax", "PretaxIncome"],
        MetricKey::InterestExpense => &["interestExpense", "InterestExpense"],
        MetricKey::IncomeTaxExpense => &["incomeTaxExpense", "TaxProvision"],
        MetricKey::NetIncome => &[
            "netIncome",
            "netIncomeApplicableToCommonShares",
            "NetIncome",
            "NetIncomeCommonStockholders",
            "earnings",
        ],
        MetricKey::BasicEps => &["basicEps", "BasicEPS", "epsActual"],
        MetricKey::DilutedEps => &["dilutedEps", "DilutedEPS"],
        MetricKey::TotalAssets => &["totalAssets", "TotalAssets"],
        MetricKey::TotalCurrentAssets => &["totalCurrentAssets", "CurrentAssets"],
        MetricKey::TotalCurrentLiabilities => &["totalCurrentLiabilities", "CurrentLiabilities"],
        MetricKey::TotalStockholderEquity => &[
            "totalStockholderEquity",
            "StockholdersEquity",
            "CommonStockEquity",
        ],
        MetricKey::TotalLiabilities => &["totalLiab", "TotalLiabilitiesNetMinorityInterest"],
        MetricKey::Cash => &["cash", "CashAndCashEquivalents"],
        MetricKey::Inventory => &["inventory", "Inventory"],
        MetricKey::OperatingCashFlow => &[
            "totalCashFromOperatingActivities",
            "OperatingCashFlow",
            "CashFlowFromContinuingOperatingActivities",
        ],
        MetricKey::CapitalExpenditure => &["capitalExpenditures", "CapitalExpenditure"],
        MetricKey::FreeCashFlow => &["freeCashFlow", "FreeCashFlow"],
    }
}
