use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use quarry_types::{
    CanonicalFundamentals, MetricKey, MetricValue, RawPeriodRecord, SourceKey, Symbol,
};

use crate::extract::{candidate_keys, extract};

/// Run the Field Extractor over `raw` for every [`MetricKey`], then fill derivable
/// metrics the provider omitted.
#[must_use]
pub fn extract_metrics(raw: &Value) -> BTreeMap<MetricKey, MetricValue> {
    let mut metrics: BTreeMap<MetricKey, MetricValue> = MetricKey::ALL
        .iter()
        .map(|&key| (key, extract(raw, candidate_keys(key))))
        .collect();
    fill_derived(&mut metrics);
    metrics
}

/// Build the canonical record for one raw period produced by `source`.
#[must_use]
pub fn canonicalize(
    symbol: &Symbol,
    record: &RawPeriodRecord,
    source: SourceKey,
    resolved_at: DateTime<Utc>,
) -> CanonicalFundamentals {
    CanonicalFundamentals {
        symbol: symbol.clone(),
        period_end_date: record.period_end_date,
        period_type: record.period_type,
        metrics: extract_metrics(&record.raw),
        source_id: source,
        resolved_at,
    }
}

/// Gross profit and free cash flow are computed when missing and both inputs are
/// present. A derived value is suspect when either input is.
fn fill_derived(metrics: &mut BTreeMap<MetricKey, MetricValue>) {
    derive(
        metrics,
        MetricKey::GrossProfit,
        MetricKey::TotalRevenue,
        MetricKey::CostOfRevenue,
        |revenue, cost| revenue - cost,
    );
    // Capital expenditure is reported negative by some sources and positive by others.
    derive(
        metrics,
        MetricKey::FreeCashFlow,
        MetricKey::OperatingCashFlow,
        MetricKey::CapitalExpenditure,
        |ocf, capex| ocf - capex.abs(),
    );
}

fn derive(
    metrics: &mut BTreeMap<MetricKey, MetricValue>,
    target: MetricKey,
    lhs: MetricKey,
    rhs: MetricKey,
    op: impl Fn(Decimal, Decimal) -> Decimal,
) {
    let get = |k: MetricKey| metrics.get(&k).copied().unwrap_or(MetricValue::MISSING);
    if get(target).value.is_some() {
        return;
    }
    let (a, b) = (get(lhs), get(rhs));
    let (Some(x), Some(y)) = (a.value, b.value) else {
        return;
    };
    metrics.insert(
        target,
        MetricValue {
            value: Some(op(x, y)),
            suspect: a.suspect || b.suspect,
        },
    );
}
