use std::sync::Arc;

use quarry::{PeriodType, QuarryError, Resolution};
use quarry_mock::{MockBehavior, MockSource};

use crate::helpers::*;

#[tokio::test]
async fn batch_isolates_per_symbol_failures() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    a.set_rule(sym(INFY), MockBehavior::Return(Vec::new()));
    let engine = engine_with(&[&a]).build().unwrap();

    let report = engine
        .resolve_many(["TCS", "not a ticker!", "INFY", "RELIANCE"], PeriodType::Quarterly)
        .await;

    let inputs: Vec<&str> = report.outcomes.iter().map(|o| o.input.as_str()).collect();
    assert_eq!(inputs, ["TCS", "not a ticker!", "INFY", "RELIANCE"]);

    assert!(report.outcomes[0].result.as_ref().unwrap().is_resolved());
    assert!(matches!(
        report.outcomes[1].result,
        Err(QuarryError::InvalidSymbol(_))
    ));
    assert!(matches!(
        report.outcomes[2].result,
        Ok(Resolution::NotAvailable(_))
    ));
    assert!(report.outcomes[3].result.as_ref().unwrap().is_resolved());

    assert_eq!(report.resolved().count(), 2);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "not a ticker!");
}

#[tokio::test]
async fn structural_failure_for_one_symbol_does_not_affect_others() {
    let a = Arc::new(MockSource::returning("A", vec![complete(day(2024, 3, 31))]));
    a.set_rule(
        sym(TCS),
        MockBehavior::Fail(QuarryError::unauthorized("A", "forbidden")),
    );
    let engine = engine_with(&[&a]).build().unwrap();

    let report = engine
        .resolve_many([TCS, INFY], PeriodType::Quarterly)
        .await;

    assert!(matches!(
        report.outcomes[0].result,
        Err(QuarryError::Unauthorized { .. })
    ));
    assert!(report.outcomes[1].result.as_ref().unwrap().is_resolved());
}

#[tokio::test]
async fn empty_batch_yields_empty_report() {
    let a = Arc::new(MockSource::empty("A"));
    let engine = engine_with(&[&a]).build().unwrap();

    let report = engine
        .resolve_many(Vec::<String>::new(), PeriodType::Annual)
        .await;

    assert!(report.outcomes.is_empty());
    assert_eq!(a.calls(), 0);
}
