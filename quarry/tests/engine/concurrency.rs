use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use quarry::{PeriodType, SourceAdapter};
use quarry_mock::MockSource;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_resolution() {
    let a = Arc::new(
        MockSource::returning("A", vec![complete(day(2024, 3, 31))])
            .with_delay(Duration::from_millis(100)),
    );
    let engine = engine_with(&[&a]).build().unwrap();

    let calls = (0..10).map(|i| {
        let engine = engine.clone();
        // Mixed spellings normalize to the same key.
        let input = if i % 2 == 0 { "tcs" } else { TCS };
        tokio::spawn(async move {
            engine
                .resolve_fundamentals(input, PeriodType::Quarterly)
                .await
        })
    });
    let results = join_all(calls).await;

    assert_eq!(a.calls(), 1);
    let first = results[0].as_ref().unwrap().as_ref().unwrap().clone();
    for r in results {
        assert_eq!(r.unwrap().unwrap(), first);
    }
    assert_eq!(engine.in_flight(), 0);
}

#[tokio::test]
async fn different_period_types_resolve_independently() {
    let a = Arc::new(
        MockSource::returning("A", vec![complete(day(2024, 3, 31))])
            .with_delay(Duration::from_millis(20)),
    );
    let engine = engine_with(&[&a]).build().unwrap();

    let (q, y) = tokio::join!(
        engine.resolve_fundamentals(TCS, PeriodType::Quarterly),
        engine.resolve_fundamentals(TCS, PeriodType::Annual),
    );

    assert!(q.unwrap().is_resolved());
    assert!(!y.unwrap().is_resolved());
    assert_eq!(a.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resolutions_respect_the_concurrency_cap() {
    let gauge = Arc::new(GaugeSource::new(
        "Gauge",
        Duration::from_millis(40),
        vec![complete(day(2024, 3, 31))],
    ));
    let engine = quarry::Engine::builder()
        .with_source(Arc::clone(&gauge) as Arc<dyn SourceAdapter>)
        .max_concurrency(2)
        .build()
        .unwrap();

    let report = engine
        .resolve_many(["TCS", "INFY", "WIPRO", "HDFCBANK", "ITC", "SBIN"], PeriodType::Quarterly)
        .await;

    assert_eq!(report.resolved().count(), 6);
    assert!(gauge.peak() <= 2, "peak was {}", gauge.peak());
    assert!(gauge.peak() >= 1);
}

#[tokio::test]
async fn dropping_the_caller_does_not_cancel_the_resolution() {
    let a = Arc::new(
        MockSource::returning("A", vec![complete(day(2024, 3, 31))])
            .with_delay(Duration::from_millis(50)),
    );
    let engine = engine_with(&[&a]).build().unwrap();

    let _ = tokio::time::timeout(
        Duration::from_millis(5),
        engine.resolve_fundamentals(TCS, PeriodType::Quarterly),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(engine.in_flight(), 0);
    let entry = engine.cached(TCS, PeriodType::Quarterly).await.unwrap();
    assert!(entry.is_some_and(|e| e.canonical.is_some()));
    assert_eq!(a.calls(), 1);
}
