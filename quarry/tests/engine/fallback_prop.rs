use std::sync::Arc;

use proptest::prelude::*;
use quarry::{PeriodType, QuarryError};
use quarry_mock::{MockBehavior, MockSource};

use crate::helpers::*;

const NAMES: [&str; 5] = ["S0", "S1", "S2", "S3", "S4"];

#[derive(Debug, Clone, Copy)]
enum Step {
    Empty,
    Transient,
    Records,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![Just(Step::Empty), Just(Step::Transient), Just(Step::Records)]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn first_source_with_records_wins_and_later_ones_are_untouched(
        steps in prop::collection::vec(step(), 1..=NAMES.len()),
    ) {
        tokio_test::block_on(async move {
            let sources: Vec<Arc<MockSource>> = steps
                .iter()
                .zip(NAMES)
                .map(|(s, name)| {
                    let behavior = match s {
                        Step::Empty => MockBehavior::Return(Vec::new()),
                        Step::Transient => {
                            MockBehavior::Fail(QuarryError::connector(name, "HTTP 502"))
                        }
                        Step::Records => MockBehavior::Return(vec![complete(day(2024, 3, 31))]),
                    };
                    Arc::new(MockSource::with_behavior(name, behavior))
                })
                .collect();
            let refs: Vec<&Arc<MockSource>> = sources.iter().collect();
            let engine = engine_with(&refs).build().unwrap();

            let res = engine
                .resolve_fundamentals(TCS, PeriodType::Quarterly)
                .await
                .unwrap();

            let winner = steps.iter().position(|s| matches!(s, Step::Records));
            match winner {
                Some(w) => {
                    assert_eq!(res.fundamentals().unwrap().source_id.as_str(), NAMES[w]);
                    for (i, src) in sources.iter().enumerate() {
                        assert_eq!(src.calls(), usize::from(i <= w), "source {i}");
                    }
                }
                None => {
                    assert!(!res.is_resolved());
                    assert!(sources.iter().all(|s| s.calls() == 1));
                }
            }
        });
    }
}
