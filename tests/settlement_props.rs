//! Property tests for settle-once monotonicity and aggregate ordering.

use std::rc::Rc;

use proptest::prelude::*;
use troth::combinator::all;
use troth::test_logging::init_test_logging;
use troth::{CycleError, FifoScheduler, Produced, Promise, Scheduler, Settlement, Settler};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reason {
    Code(u8),
    Cycle,
}

impl From<CycleError> for Reason {
    fn from(_: CycleError) -> Self {
        Self::Cycle
    }
}

fn harness() -> (Rc<FifoScheduler>, Scheduler) {
    init_test_logging();
    let driver = FifoScheduler::new();
    let scheduler = Scheduler::new(driver.clone());
    (driver, scheduler)
}

/// One externally-driven settlement attempt.
#[derive(Debug, Clone)]
enum Attempt {
    Fulfill(i32),
    Reject(u8),
}

impl Attempt {
    fn apply(&self, settler: &Settler<i32, Reason>) {
        match self {
            Self::Fulfill(value) => settler.fulfill(*value),
            Self::Reject(code) => settler.reject(Reason::Code(*code)),
        }
    }

    fn as_settlement(&self) -> Settlement<i32, Reason> {
        match self {
            Self::Fulfill(value) => Settlement::Fulfilled(*value),
            Self::Reject(code) => Settlement::Rejected(Reason::Code(*code)),
        }
    }
}

fn attempt() -> impl Strategy<Value = Attempt> {
    prop_oneof![
        any::<i32>().prop_map(Attempt::Fulfill),
        any::<u8>().prop_map(Attempt::Reject),
    ]
}

proptest! {
    /// Whatever sequence of settlement attempts arrives, the first one wins
    /// and the payload never changes afterwards.
    #[test]
    fn first_settlement_attempt_wins(attempts in prop::collection::vec(attempt(), 1..8)) {
        let (driver, scheduler) = harness();
        let (promise, settler) = Promise::<i32, Reason>::parts(&scheduler);

        for (index, current) in attempts.iter().enumerate() {
            current.apply(&settler);
            // Interleave drains at arbitrary points; settlement is already
            // final, so drains must not change anything.
            if index % 2 == 0 {
                driver.run_until_idle();
            }
        }
        driver.run_until_idle();

        prop_assert_eq!(promise.settlement(), Some(attempts[0].as_settlement()));
    }

    /// `all` fulfills in input index order for every completion order.
    #[test]
    fn all_is_input_ordered_for_any_completion_order(
        // A shuffled completion schedule over five members.
        order in Just(vec![0usize, 1, 2, 3, 4]).prop_shuffle(),
    ) {
        let (driver, scheduler) = harness();
        let mut members = Vec::new();
        let mut settlers = Vec::new();
        for _ in 0..order.len() {
            let (promise, settler) = Promise::<i32, Reason>::parts(&scheduler);
            members.push(Produced::Chain(promise));
            settlers.push(settler);
        }
        let aggregate = all(&scheduler, members);

        for &index in &order {
            settlers[index].fulfill(i32::try_from(index).unwrap() * 10);
            driver.run_until_idle();
        }

        let expected: Vec<i32> = (0..order.len()).map(|i| i32::try_from(i).unwrap() * 10).collect();
        prop_assert_eq!(aggregate.settlement(), Some(Settlement::Fulfilled(expected)));
    }

    /// Settling from within a scheduled continuation behaves identically to
    /// settling from the registering stack.
    #[test]
    fn settlement_from_a_continuation_is_equivalent(value in any::<i32>()) {
        let (driver, scheduler) = harness();
        let (promise, settler) = Promise::<i32, Reason>::parts(&scheduler);

        let deferred_settler = settler.clone();
        scheduler.defer(move || deferred_settler.fulfill(value));
        driver.run_until_idle();

        // A later direct attempt is a no-op.
        settler.fulfill(value.wrapping_add(1));
        driver.run_until_idle();

        prop_assert_eq!(promise.settlement(), Some(Settlement::Fulfilled(value)));
    }
}
