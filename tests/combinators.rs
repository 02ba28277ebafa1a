//! Aggregate combinator behavior across the public API.

use std::rc::Rc;

use troth::combinator::{all, all_settled, race};
use troth::test_logging::init_test_logging;
use troth::{CycleError, FifoScheduler, Produced, Promise, Scheduler, Settlement};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reason {
    Boom(&'static str),
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

#[test]
fn all_keeps_input_order_when_a_middle_member_settles_last() {
    let (driver, scheduler) = harness();
    let (middle, middle_settler) = Promise::<i32, Reason>::parts(&scheduler);
    let aggregate = all(
        &scheduler,
        vec![Produced::Value(1), Produced::Chain(middle), Produced::Value(3)],
    );

    // Members 1 and 3 settle during this drain; member 2 is still pending.
    driver.run_until_idle();
    assert!(aggregate.state().is_pending());

    middle_settler.fulfill(2);
    driver.run_until_idle();
    assert_eq!(
        aggregate.settlement(),
        Some(Settlement::Fulfilled(vec![1, 2, 3]))
    );
}

#[test]
fn all_rejects_with_the_first_failure() {
    let (driver, scheduler) = harness();
    let (first, first_settler) = Promise::<i32, Reason>::parts(&scheduler);
    let (second, second_settler) = Promise::<i32, Reason>::parts(&scheduler);
    let aggregate = all(
        &scheduler,
        vec![Produced::Chain(first), Produced::Chain(second)],
    );

    second_settler.reject(Reason::Boom("second"));
    driver.run_until_idle();
    first_settler.reject(Reason::Boom("first"));
    driver.run_until_idle();

    assert_eq!(
        aggregate.settlement(),
        Some(Settlement::Rejected(Reason::Boom("second")))
    );
}

#[test]
fn all_empty_fulfills_with_an_empty_sequence() {
    let (driver, scheduler) = harness();
    let aggregate = all::<i32, Reason, _>(&scheduler, Vec::new());
    driver.run_until_idle();
    assert_eq!(aggregate.settlement(), Some(Settlement::Fulfilled(Vec::new())));
}

#[test]
fn race_settles_with_the_fast_member() {
    let (driver, scheduler) = harness();
    let (never, _held) = Promise::<&str, Reason>::parts(&scheduler);
    let winner = race(
        &scheduler,
        vec![Produced::Chain(never), Produced::Value("fast")],
    );

    driver.run_until_idle();
    assert_eq!(winner.settlement(), Some(Settlement::Fulfilled("fast")));
}

#[test]
fn race_empty_never_settles() {
    let (driver, scheduler) = harness();
    let winner = race::<i32, Reason, _>(&scheduler, Vec::new());

    // Drain repeatedly: nothing will ever be scheduled for this promise.
    for _ in 0..3 {
        driver.run_until_idle();
        assert!(winner.state().is_pending());
    }
}

#[test]
fn race_against_an_empty_race_is_won_by_the_real_member() {
    let (driver, scheduler) = harness();
    let empty = race::<i32, Reason, _>(&scheduler, Vec::new());
    let winner = race(
        &scheduler,
        vec![Produced::Chain(empty), Produced::Value(42)],
    );

    driver.run_until_idle();
    assert_eq!(winner.settlement(), Some(Settlement::Fulfilled(42)));
}

#[test]
fn all_settled_records_mixed_outcomes_without_rejecting() {
    let (driver, scheduler) = harness();
    let fulfilled = Promise::<i32, Reason>::resolve(&scheduler, Produced::Value(1));
    let rejected = Promise::<i32, Reason>::reject(&scheduler, Reason::Boom("e"));
    let aggregate = all_settled(
        &scheduler,
        vec![Produced::Chain(fulfilled), Produced::Chain(rejected)],
    );

    driver.run_until_idle();
    let records = match aggregate.settlement() {
        Some(Settlement::Fulfilled(records)) => records,
        other => panic!("all_settled must fulfill, got {other:?}"),
    };
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status(), "fulfilled");
    assert_eq!(records[0].value(), Some(&1));
    assert_eq!(records[1].status(), "rejected");
    assert_eq!(records[1].reason(), Some(&Reason::Boom("e")));
}

#[test]
fn combinators_compose_with_then() {
    let (driver, scheduler) = harness();
    let summed = all::<i32, Reason, _>(
        &scheduler,
        vec![Produced::Value(1), Produced::Value(2), Produced::Value(3)],
    )
    .then_fulfilled(|values: Vec<i32>| Ok(Produced::Value(values.iter().sum::<i32>())));

    driver.run_until_idle();
    assert_eq!(summed.settlement(), Some(Settlement::Fulfilled(6)));
}
