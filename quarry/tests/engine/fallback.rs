use std::sync::Arc;
use std::time::Duration;

use quarry::{MetricKey, PeriodType, QuarryError, Resolution};
use quarry_mock::MockSource;
use rust_decimal::Decimal;

use crate::helpers::*;

#[tokio::test]
async fn falls_back_to_statement_history_when_timeseries_is_empty() {
    init_tracing();
    let timeseries = Arc::new(MockSource::empty("TimeSeries"));
    let history = Arc::new(MockSource::returning(
        "StatementHistory",
        vec![statement_record(
            day(2024, 6, 30),
            PeriodType::Quarterly,
            &[("totalRevenue", 2_500_000), ("netIncome", 0)],
        )],
    ));
    let chart = Arc::new(MockSource::returning(
        "EarningsChart",
        vec![earnings_record(day(2024, 6, 30), 1, 1)],
    ));
    let engine = engine_with(&[&timeseries, &history, &chart]).build().unwrap();

    let res = engine
        .resolve_fundamentals("RELIANCE", PeriodType::Quarterly)
        .await
        .unwrap();
    let f = res.fundamentals().expect("resolved");

    assert_eq!(f.symbol.as_str(), RELIANCE);
    assert_eq!(f.source_id.as_str(), "StatementHistory");
    assert_eq!(f.period_end_date, day(2024, 6, 30));

    let revenue = f.metric(MetricKey::TotalRevenue);
    assert_eq!(revenue.value, Some(Decimal::from(2_500_000)));
    assert!(!revenue.suspect);

    let net = f.metric(MetricKey::NetIncome);
    assert_eq!(net.value, Some(Decimal::ZERO));
    assert!(net.suspect, "zero from an upstream payload is suspect");

    assert_eq!(timeseries.calls(), 1);
    assert_eq!(history.calls(), 1);
    assert_eq!(chart.calls(), 0);
}

#[tokio::test]
async fn first_source_with_records_wins() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    let b = Arc::new(MockSource::returning("B", vec![complete(day(2024, 6, 30))]));
    let engine = engine_with(&[&a, &b]).build().unwrap();

    let res = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals().unwrap().source_id.as_str(), "A");
    assert_eq!(res.fundamentals().unwrap().period_end_date, day(2024, 3, 31));
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn picks_latest_period_of_requested_cadence() {
    let a = Arc::new(MockSource::returning(
        "A",
        vec![
            statement_record(day(2023, 12, 31), PeriodType::Quarterly, &[("totalRevenue", 1)]),
            statement_record(day(2024, 3, 31), PeriodType::Annual, &[("totalRevenue", 2)]),
            statement_record(day(2024, 3, 31), PeriodType::Quarterly, &[("totalRevenue", 3)]),
        ],
    ));
    let engine = engine_with(&[&a]).build().unwrap();

    let q = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();
    let f = q.fundamentals().unwrap();
    assert_eq!(f.period_type, PeriodType::Quarterly);
    assert_eq!(f.metric(MetricKey::TotalRevenue).value, Some(Decimal::from(3)));
}

#[tokio::test]
async fn records_of_the_wrong_cadence_fall_through() {
    let a = Arc::new(MockSource::returning(
        "A",
        vec![statement_record(day(2024, 3, 31), PeriodType::Annual, &[("totalRevenue", 9)])],
    ));
    let b = Arc::new(MockSource::returning("B", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a, &b]).build().unwrap();

    let res = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals().unwrap().source_id.as_str(), "B");
    assert_eq!(a.calls(), 1);
}

#[tokio::test]
async fn all_sources_empty_reports_not_available() {
    let a = Arc::new(MockSource::empty("A"));
    let b = Arc::new(MockSource::empty("B"));
    let engine = engine_with(&[&a, &b]).build().unwrap();

    let res = engine
        .resolve_fundamentals(INFY, PeriodType::Quarterly)
        .await
        .unwrap();

    match res {
        Resolution::NotAvailable(na) => {
            assert_eq!(na.symbol.as_str(), INFY);
            assert_eq!(na.consecutive_failures, 1);
            assert!(na.last_known.is_none());
        }
        other => panic!("expected NotAvailable, got {other:?}"),
    }
    assert_eq!((a.calls(), b.calls()), (1, 1));

    let entry = engine
        .cached(INFY, PeriodType::Quarterly)
        .await
        .unwrap()
        .expect("failure is recorded");
    assert_eq!(entry.consecutive_failures, 1);
    assert!(entry.canonical.is_none());
}

#[tokio::test]
async fn structural_error_aborts_the_walk() {
    init_tracing();
    let a = Arc::new(MockSource::failing(
        "A",
        QuarryError::unauthorized("A", "invalid crumb"),
    ));
    let b = Arc::new(MockSource::returning("B", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a, &b]).build().unwrap();

    let err = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap_err();

    assert!(matches!(err, QuarryError::Unauthorized { .. }), "got {err:?}");
    assert_eq!(b.calls(), 0);
    assert!(
        engine.cached(TCS, PeriodType::Quarterly).await.unwrap().is_none(),
        "structural failures leave the store untouched"
    );
}

#[tokio::test]
async fn transient_errors_fall_through() {
    let a = Arc::new(MockSource::failing("A", QuarryError::connector("A", "HTTP 503")));
    let b = Arc::new(MockSource::failing("B", QuarryError::rate_limited("B", Some(1_000))));
    let c = Arc::new(MockSource::returning("C", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a, &b, &c]).build().unwrap();

    let res = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals().unwrap().source_id.as_str(), "C");
}

#[tokio::test]
async fn timed_out_source_falls_through() {
    let slow = Arc::new(MockSource::hanging("Slow"));
    let fast = Arc::new(MockSource::returning("Fast", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&slow, &fast])
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let res = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals().unwrap().source_id.as_str(), "Fast");
    assert_eq!(slow.calls(), 1);
}

#[tokio::test]
async fn invalid_symbol_is_rejected_before_any_source_call() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a]).build().unwrap();

    let err = engine
        .resolve_fundamentals("AAPL.US", PeriodType::Quarterly)
        .await
        .unwrap_err();

    assert!(matches!(err, QuarryError::InvalidSymbol(_)));
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn sources_receive_the_lookback_window() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a])
        .lookback(Duration::from_secs(30 * 86_400))
        .build()
        .unwrap();

    engine
        .resolve_fundamentals(TCS, PeriodType::Annual)
        .await
        .unwrap();

    let call = &a.requests()[0];
    assert_eq!(call.symbol.as_str(), TCS);
    assert_eq!(call.period_type, PeriodType::Annual);
    let expected = (chrono::Utc::now() - chrono::TimeDelta::days(30)).date_naive();
    assert!((expected - call.since).num_days().abs() <= 1);
}
