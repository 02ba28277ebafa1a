//! Wait for every member, fail on the first rejection.

use crate::adopt::Produced;
use crate::error::CycleError;
use crate::promise::{Promise, Settler};
use crate::scheduler::Scheduler;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Returns a promise that fulfills with every member's value, in input
/// index order regardless of completion order.
///
/// A completion counter is compared against the input length; the promise
/// fulfills once they match. The first member rejection rejects the
/// aggregate with that reason, and every later member settlement is
/// ignored. An empty input fulfills immediately with an empty vec.
pub fn all<V, E, I>(scheduler: &Scheduler, members: I) -> Promise<Vec<V>, E>
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

    let slots: Rc<RefCell<Vec<Option<V>>>> =
        Rc::new(RefCell::new((0..total).map(|_| None).collect()));
    let done = Rc::new(Cell::new(0usize));

    for (index, member) in members.into_iter().enumerate() {
        let member = Promise::resolve(scheduler, member);
        observe(&member, index, total, &slots, &done, &settler);
    }
    promise
}

fn observe<V, E>(
    member: &Promise<V, E>,
    index: usize,
    total: usize,
    slots: &Rc<RefCell<Vec<Option<V>>>>,
    done: &Rc<Cell<usize>>,
    settler: &Settler<Vec<V>, E>,
) where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    let slots = Rc::clone(slots);
    let done = Rc::clone(done);
    let on_value = settler.clone();
    let on_reason = settler.clone();

    member.then(
        move |value| {
            // Indexed store keeps the result order aligned with the input
            // even when a later member settles first.
            slots.borrow_mut()[index] = Some(value);
            done.set(done.get() + 1);
            if done.get() == total {
                let values = slots
                    .borrow_mut()
                    .iter_mut()
                    .map(|slot| slot.take().expect("counter matched input length"))
                    .collect();
                on_value.fulfill(values);
            }
            Ok(Produced::Value(()))
        },
        move |reason| {
            on_reason.reject(reason);
            Ok(Produced::Value(()))
        },
    );
}
