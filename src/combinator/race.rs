//! First settlement wins.

use crate::adopt::Produced;
use crate::error::CycleError;
use crate::promise::Promise;
use crate::scheduler::Scheduler;

/// Returns a promise that settles with the outcome of whichever member
/// settles first, fulfilled or rejected; every later settlement is ignored.
///
/// An empty input never settles: a race with no members has no first
/// settlement, so the promise stays pending forever.
pub fn race<V, E, I>(scheduler: &Scheduler, members: I) -> Promise<V, E>
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
    I: IntoIterator<Item = Produced<V, E>>,
{
    let (promise, settler) = Promise::parts(scheduler);

    for member in members {
        let member = Promise::resolve(scheduler, member);
        let on_value = settler.clone();
        let on_reason = settler.clone();
        member.then(
            move |value| {
                on_value.fulfill(value);
                Ok(Produced::Value(()))
            },
            move |reason| {
                on_reason.reject(reason);
                Ok(Produced::Value(()))
            },
        );
    }
    promise
}
