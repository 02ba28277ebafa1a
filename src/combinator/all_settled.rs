//! Wait for every member, recording each outcome.

use crate::adopt::Produced;
use crate::error::CycleError;
use crate::promise::{Promise, Settlement, Settler};
use crate::scheduler::Scheduler;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Returns a promise that fulfills — never rejects — once every member has
/// settled, with an index-aligned [`Settlement`] record per member.
///
/// An empty input fulfills immediately with an empty vec.
pub fn all_settled<V, E, I>(scheduler: &Scheduler, members: I) -> Promise<Vec<Settlement<V, E>>, E>
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
    I: IntoIterator<Item = Produced<V, E>>,
{
    let (promise, settler) = Promise::parts(scheduler);
    let members: Vec<_> = members.into_iter().collect();
    let total = members.len();

    if total == 0 {
        settler.fulfill(Vec::new());
        return promise;
    }

    let slots: Rc<RefCell<Vec<Option<Settlement<V, E>>>>> =
        Rc::new(RefCell::new((0..total).map(|_| None).collect()));
    let done = Rc::new(Cell::new(0usize));

    for (index, member) in members.into_iter().enumerate() {
        let member = Promise::resolve(scheduler, member);
        let record_value = recorder(index, total, Rc::clone(&slots), Rc::clone(&done), settler.clone());
        let record_reason = recorder(index, total, Rc::clone(&slots), Rc::clone(&done), settler.clone());
        member.then(
            move |value| {
                record_value(Settlement::Fulfilled(value));
                Ok(Produced::Value(()))
            },
            move |reason| {
                record_reason(Settlement::Rejected(reason));
                Ok(Produced::Value(()))
            },
        );
    }
    promise
}

/// Builds the shared record-one-outcome closure for a member index.
fn recorder<V, E>(
    index: usize,
    total: usize,
    slots: Rc<RefCell<Vec<Option<Settlement<V, E>>>>>,
    done: Rc<Cell<usize>>,
    settler: Settler<Vec<Settlement<V, E>>, E>,
) -> impl Fn(Settlement<V, E>) + 'static
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    move |outcome| {
        slots.borrow_mut()[index] = Some(outcome);
        done.set(done.get() + 1);
        if done.get() == total {
            let records = slots
                .borrow_mut()
                .iter_mut()
                .map(|slot| slot.take().expect("counter matched input length"))
                .collect();
            settler.fulfill(records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FifoScheduler;
    use crate::test_logging::init_test_logging;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Reason {
        Boom,
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
    fn empty_input_fulfills_immediately() {
        let (driver, scheduler) = harness();
        let aggregate = all_settled::<i32, Reason, _>(&scheduler, Vec::new());
        driver.run_until_idle();
        assert_eq!(aggregate.settlement(), Some(Settlement::Fulfilled(Vec::new())));
    }

    #[test]
    fn records_every_outcome_without_rejecting() {
        let (driver, scheduler) = harness();
        let fulfilled = Promise::<i32, Reason>::resolve(&scheduler, Produced::Value(1));
        let rejected = Promise::<i32, Reason>::reject(&scheduler, Reason::Boom);
        let aggregate = all_settled(
            &scheduler,
            vec![Produced::Chain(fulfilled), Produced::Chain(rejected)],
        );

        driver.run_until_idle();
        assert_eq!(
            aggregate.settlement(),
            Some(Settlement::Fulfilled(vec![
                Settlement::Fulfilled(1),
                Settlement::Rejected(Reason::Boom),
            ]))
        );
    }

    #[test]
    fn records_stay_index_aligned_under_reversed_completion() {
        let (driver, scheduler) = harness();
        let (first, first_settler) = Promise::<i32, Reason>::parts(&scheduler);
        let (second, second_settler) = Promise::<i32, Reason>::parts(&scheduler);
        let aggregate = all_settled(
            &scheduler,
            vec![Produced::Chain(first), Produced::Chain(second)],
        );

        second_settler.reject(Reason::Boom);
        driver.run_until_idle();
        assert!(aggregate.state().is_pending());

        first_settler.fulfill(11);
        driver.run_until_idle();
        assert_eq!(
            aggregate.settlement(),
            Some(Settlement::Fulfilled(vec![
                Settlement::Fulfilled(11),
                Settlement::Rejected(Reason::Boom),
            ]))
        );
    }
}
