use std::sync::Arc;
use std::time::Duration;

use quarry::{CacheStore, MemoryStore, MetricClass, MetricKey, PeriodType};
use quarry_mock::MockSource;

use crate::helpers::*;

#[tokio::test]
async fn fresh_entry_is_served_without_source_calls() {
    let store = MemoryStore::new();
    let cached = canonical(RELIANCE, &complete(day(2024, 3, 31)), "TimeSeries");
    store
        .put(entry_aged(cached.clone(), Duration::from_secs(600)))
        .await
        .unwrap();

    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 6, 30))]));
    let engine = engine_with(&[&a])
        .store(Arc::new(store))
        .refresh_interval(Duration::from_secs(6 * 3600))
        .build()
        .unwrap();

    let res = engine
        .resolve_fundamentals("reliance", PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals(), Some(&cached));
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn expired_entry_is_refreshed() {
    let store = MemoryStore::new();
    let cached = canonical(RELIANCE, &complete(day(2024, 3, 31)), "TimeSeries");
    store
        .put(entry_aged(cached, Duration::from_secs(7 * 3600)))
        .await
        .unwrap();

    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 6, 30))]));
    let engine = engine_with(&[&a])
        .store(Arc::new(store.clone()))
        .refresh_interval(Duration::from_secs(6 * 3600))
        .build()
        .unwrap();

    let res = engine
        .resolve_fundamentals(RELIANCE, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(res.fundamentals().unwrap().period_end_date, day(2024, 6, 30));
    assert_eq!(a.calls(), 1);
    let stored = store.get(&quarterly(RELIANCE)).await.unwrap().unwrap();
    assert_eq!(stored.canonical.unwrap().source_id.as_str(), "A");
}

#[tokio::test]
async fn shortest_class_interval_applies() {
    let store = MemoryStore::new();
    // Populates income statement and balance sheet metrics.
    let cached = canonical(RELIANCE, &complete(day(2024, 3, 31)), "TimeSeries");
    store
        .put(entry_aged(cached, Duration::from_secs(2 * 3600)))
        .await
        .unwrap();

    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 6, 30))]));
    let engine = engine_with(&[&a])
        .store(Arc::new(store))
        .refresh_interval(Duration::from_secs(24 * 3600))
        .refresh_interval_for(MetricClass::BalanceSheet, Duration::from_secs(3600))
        .build()
        .unwrap();

    engine
        .resolve_fundamentals(RELIANCE, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(a.calls(), 1);
}

#[tokio::test]
async fn resolving_twice_within_the_interval_is_idempotent() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    let engine = engine_with(&[&a]).build().unwrap();

    let first = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();
    let second = engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(a.calls(), 1);
}

#[tokio::test]
async fn incomplete_record_is_retried_up_to_the_ceiling() {
    // Earnings chart rows carry revenue and earnings only.
    let a = Arc::new(MockSource::returning(
        "EarningsChart",
        vec![earnings_record(day(2024, 3, 31), 500, 50)],
    ));
    let engine = engine_with(&[&a]).retry_ceiling(2).build().unwrap();

    for _ in 0..4 {
        let res = engine
            .resolve_fundamentals(TCS, PeriodType::Quarterly)
            .await
            .unwrap();
        assert!(res.is_resolved());
    }

    assert_eq!(a.calls(), 2);
    let entry = engine.cached(TCS, PeriodType::Quarterly).await.unwrap().unwrap();
    assert_eq!(entry.incomplete_refreshes, 2);
    assert_eq!(entry.consecutive_failures, 0);
}

#[tokio::test]
async fn suspect_zero_in_required_metric_counts_as_incomplete() {
    let a = Arc::new(MockSource::returning(
        "A",
        vec![statement_record(
            day(2024, 3, 31),
            PeriodType::Quarterly,
            &[("totalRevenue", 100), ("netIncome", 0)],
        )],
    ));
    let engine = engine_with(&[&a])
        .required_metrics([MetricKey::TotalRevenue, MetricKey::NetIncome])
        .retry_ceiling(3)
        .build()
        .unwrap();

    for _ in 0..5 {
        engine
            .resolve_fundamentals(TCS, PeriodType::Quarterly)
            .await
            .unwrap();
    }

    assert_eq!(a.calls(), 3);
}

#[tokio::test]
async fn complete_refresh_resets_incomplete_counter() {
    let a = Arc::new(MockSource::returning(
        "A",
        vec![earnings_record(day(2024, 3, 31), 500, 50)],
    ));
    let engine = engine_with(&[&a]).retry_ceiling(5).build().unwrap();

    engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();
    assert_eq!(
        engine
            .cached(TCS, PeriodType::Quarterly)
            .await
            .unwrap()
            .unwrap()
            .incomplete_refreshes,
        1
    );

    a.set_behavior(quarry_mock::MockBehavior::Return(vec![complete(day(2024, 3, 31))]));
    engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();

    let entry = engine.cached(TCS, PeriodType::Quarterly).await.unwrap().unwrap();
    assert_eq!(entry.incomplete_refreshes, 0);
    assert_eq!(a.calls(), 2);

    engine
        .resolve_fundamentals(TCS, PeriodType::Quarterly)
        .await
        .unwrap();
    assert_eq!(a.calls(), 2, "complete record is served from cache");
}

#[tokio::test]
async fn failed_refresh_is_retried_on_next_request() {
    let a = Arc::new(MockSource::empty("A"));
    let engine = engine_with(&[&a]).build().unwrap();

    for expected in 1..=3 {
        let res = engine
            .resolve_fundamentals(TCS, PeriodType::Quarterly)
            .await
            .unwrap();
        match res {
            quarry::Resolution::NotAvailable(na) => assert_eq!(na.consecutive_failures, expected),
            other => panic!("expected NotAvailable, got {other:?}"),
        }
    }
    assert_eq!(a.calls(), 3);
}
