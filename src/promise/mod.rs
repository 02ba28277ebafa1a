//! The settle-once deferred-value state machine.
//!
//! A [`Promise`] is a container for a value that is not yet known. It starts
//! `Pending` and settles at most once: `Pending → Fulfilled` or `Pending →
//! Rejected`, both terminal. Chaining calls register continuation pairs that
//! are drained, in registration order, through the injected [`Scheduler`]
//! when the promise settles — never synchronously, even when the promise was
//! already settled at registration time.
//!
//! # Example
//!
//! ```
//! use troth::{FifoScheduler, Produced, Promise, Scheduler};
//!
//! let driver = FifoScheduler::new();
//! let scheduler = Scheduler::new(driver.clone());
//!
//! let doubled = Promise::<i32, troth::CycleError>::new(&scheduler, |settler| {
//!     settler.fulfill(21);
//!     Ok(())
//! })
//! .then_fulfilled(|n| Ok(Produced::Value(n * 2)));
//!
//! driver.run_until_idle();
//! assert_eq!(doubled.settlement().unwrap().value(), Some(&42));
//! ```

use crate::adopt::{Handled, Produced, resolve_produced};
use crate::error::CycleError;
use crate::scheduler::Scheduler;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Observable lifecycle state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a reason.
    Rejected,
}

impl PromiseState {
    /// Returns the state name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if the promise has not settled.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the promise settled with a value.
    #[must_use]
    pub const fn is_fulfilled(self) -> bool {
        matches!(self, Self::Fulfilled)
    }

    /// Returns true if the promise settled with a reason.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl fmt::Display for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded outcome of a settled promise.
///
/// Also the element type of [`all_settled`](crate::combinator::all_settled)
/// result sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<V, E> {
    /// Settled with a value.
    Fulfilled(V),
    /// Settled with a reason.
    Rejected(E),
}

impl<V, E> Settlement<V, E> {
    /// Returns the status name, `"fulfilled"` or `"rejected"`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }

    /// Returns true if this settlement carries a value.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if this settlement carries a reason.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the value, if fulfilled.
    #[must_use]
    pub const fn value(&self) -> Option<&V> {
        match self {
            Self::Fulfilled(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the reason, if rejected.
    #[must_use]
    pub const fn reason(&self) -> Option<&E> {
        match self {
            Self::Fulfilled(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Internal settlement state. Monotonic: leaves `Pending` at most once.
pub(crate) enum State<V, E> {
    Pending,
    Fulfilled(V),
    Rejected(E),
}

impl<V, E> State<V, E> {
    pub(crate) const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub(crate) const fn observable(&self) -> PromiseState {
        match self {
            Self::Pending => PromiseState::Pending,
            Self::Fulfilled(_) => PromiseState::Fulfilled,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }
}

type FulfillQueue<V> = SmallVec<[Box<dyn FnOnce(V)>; 2]>;
type RejectQueue<E> = SmallVec<[Box<dyn FnOnce(E)>; 2]>;

/// Shared mutable core of one promise.
pub(crate) struct Inner<V, E> {
    state: State<V, E>,
    fulfill_queue: FulfillQueue<V>,
    reject_queue: RejectQueue<E>,
}

pub(crate) type Shared<V, E> = Rc<RefCell<Inner<V, E>>>;

/// Transitions `Pending → Fulfilled`, draining the fulfill queue through the
/// scheduler. A no-op on an already-settled promise.
pub(crate) fn settle_fulfilled<V, E>(inner: &Shared<V, E>, scheduler: &Scheduler, value: V)
where
    V: Clone + 'static,
    E: Clone + 'static,
{
    let drained = {
        let mut inner = inner.borrow_mut();
        if !inner.state.is_pending() {
            return;
        }
        inner.state = State::Fulfilled(value.clone());
        inner.reject_queue.clear();
        std::mem::take(&mut inner.fulfill_queue)
    };
    tracing::trace!(continuations = drained.len(), "promise fulfilled");
    for continuation in drained {
        let value = value.clone();
        scheduler.defer(move || continuation(value));
    }
}

/// Transitions `Pending → Rejected`, draining the reject queue through the
/// scheduler. A no-op on an already-settled promise.
pub(crate) fn settle_rejected<V, E>(inner: &Shared<V, E>, scheduler: &Scheduler, reason: E)
where
    V: Clone + 'static,
    E: Clone + 'static,
{
    let drained = {
        let mut inner = inner.borrow_mut();
        if !inner.state.is_pending() {
            return;
        }
        inner.state = State::Rejected(reason.clone());
        inner.fulfill_queue.clear();
        std::mem::take(&mut inner.reject_queue)
    };
    tracing::trace!(continuations = drained.len(), "promise rejected");
    for continuation in drained {
        let reason = reason.clone();
        scheduler.defer(move || continuation(reason));
    }
}

/// A container for the eventual result of an operation.
///
/// Cloning a `Promise` clones the handle, not the eventual value: all clones
/// observe the same settlement. Payloads are cloned out to each registered
/// continuation, hence the `V: Clone`, `E: Clone` bounds. Rejection reasons
/// must absorb [`CycleError`] so a self-adopting chain can reject instead of
/// deadlocking.
pub struct Promise<V, E> {
    inner: Shared<V, E>,
    scheduler: Scheduler,
}

impl<V, E> Clone for Promise<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<V, E> fmt::Debug for Promise<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.inner.borrow().state.observable())
            .finish()
    }
}

impl<V, E> Promise<V, E>
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    /// Creates a pending promise bound to the given scheduler.
    pub(crate) fn pending(scheduler: &Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::Pending,
                fulfill_queue: SmallVec::new(),
                reject_queue: SmallVec::new(),
            })),
            scheduler: scheduler.clone(),
        }
    }

    /// Constructs a promise by running `initializer` synchronously with a
    /// [`Settler`] for the new promise.
    ///
    /// An `Err` returned by the initializer is routed to rejection; this is
    /// the only place a construction-time failure is caught. The settler may
    /// also be stored and used later, including from a scheduled
    /// continuation.
    pub fn new<F>(scheduler: &Scheduler, initializer: F) -> Self
    where
        F: FnOnce(Settler<V, E>) -> Result<(), E>,
    {
        let promise = Self::pending(scheduler);
        let settler = Settler {
            inner: Rc::clone(&promise.inner),
            scheduler: scheduler.clone(),
        };
        if let Err(reason) = initializer(settler) {
            settle_rejected(&promise.inner, scheduler, reason);
        }
        promise
    }

    /// Creates a promise together with its external settlement handle.
    ///
    /// The bundle form of construction: the promise side is handed to
    /// consumers, the settler side to whatever produces the value.
    pub fn parts(scheduler: &Scheduler) -> (Self, Settler<V, E>) {
        let promise = Self::pending(scheduler);
        let settler = Settler {
            inner: Rc::clone(&promise.inner),
            scheduler: scheduler.clone(),
        };
        (promise, settler)
    }

    /// Coerces a produced value into a promise.
    ///
    /// A [`Produced::Chain`] is returned unchanged — an existing promise is
    /// never re-wrapped. Anything else settles a fresh promise through the
    /// resolution procedure, so foreign thenables are adopted rather than
    /// stored as-is.
    pub fn resolve(scheduler: &Scheduler, produced: Produced<V, E>) -> Self {
        match produced {
            Produced::Chain(promise) => promise,
            other => {
                let promise = Self::pending(scheduler);
                resolve_produced(&promise.inner, scheduler, other);
                promise
            }
        }
    }

    /// Creates a promise rejected with `reason`.
    pub fn reject(scheduler: &Scheduler, reason: E) -> Self {
        let promise = Self::pending(scheduler);
        settle_rejected(&promise.inner, scheduler, reason);
        promise
    }

    /// Returns the current observable state.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.observable()
    }

    /// Returns a copy of the settlement, if any.
    #[must_use]
    pub fn settlement(&self) -> Option<Settlement<V, E>> {
        match &self.inner.borrow().state {
            State::Pending => None,
            State::Fulfilled(value) => Some(Settlement::Fulfilled(value.clone())),
            State::Rejected(reason) => Some(Settlement::Rejected(reason.clone())),
        }
    }

    /// Returns true if both handles refer to the same underlying promise.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Registers a continuation pair and returns the derived promise.
    ///
    /// `on_fulfilled` runs with the parent's value, `on_rejected` with its
    /// reason; whichever runs feeds its `Ok` output into the resolution
    /// procedure against the derived promise, while an `Err` rejects the
    /// derived promise directly. Both branches are dispatched through the
    /// scheduler, even when the parent is already settled.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(V) -> Handled<U, E> + 'static,
        R: FnOnce(E) -> Handled<U, E> + 'static,
    {
        let child = Promise::pending(&self.scheduler);
        let target = Rc::clone(&child.inner);
        let scheduler = self.scheduler.clone();

        let fulfill_branch: Box<dyn FnOnce(V)> = {
            let target = Rc::clone(&target);
            let scheduler = scheduler.clone();
            Box::new(move |value| match on_fulfilled(value) {
                Ok(produced) => resolve_produced(&target, &scheduler, produced),
                Err(reason) => settle_rejected(&target, &scheduler, reason),
            })
        };
        let reject_branch: Box<dyn FnOnce(E)> =
            Box::new(move |reason| match on_rejected(reason) {
                Ok(produced) => resolve_produced(&target, &scheduler, produced),
                Err(reason) => settle_rejected(&target, &scheduler, reason),
            });

        self.subscribe(fulfill_branch, reject_branch);
        child
    }

    /// [`then`](Self::then) with the failure branch defaulted to re-raise.
    pub fn then_fulfilled<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(V) -> Handled<U, E> + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// [`then`](Self::then) with the success branch defaulted to pass the
    /// value through unchanged. Returns the derived promise, so recovery
    /// chains keep composing.
    pub fn catch<R>(&self, on_rejected: R) -> Self
    where
        R: FnOnce(E) -> Handled<V, E> + 'static,
    {
        self.then(|value| Ok(Produced::Value(value)), on_rejected)
    }

    /// Runs `f` with no argument once this promise settles, either way.
    ///
    /// The original payload is not inspected or transformed: after `f`'s
    /// (possibly deferred) completion the derived promise re-settles with
    /// the original value or reason. The one exception is a failure of `f`
    /// itself — a synchronous `Err` or a rejected chain — which always
    /// propagates in place of the original outcome.
    pub fn finally<F>(&self, f: F) -> Self
    where
        F: FnOnce() -> Handled<(), E> + 'static,
    {
        // One side effect, two branches; only the branch that runs takes it.
        let slot = Rc::new(RefCell::new(Some(f)));
        let slot_rejected = Rc::clone(&slot);
        let scheduler = self.scheduler.clone();
        let scheduler_rejected = scheduler.clone();

        self.then(
            move |value: V| {
                let f = slot
                    .borrow_mut()
                    .take()
                    .expect("settlement runs exactly one branch");
                let side = Promise::resolve(&scheduler, f()?);
                Ok(Produced::Chain(
                    side.then_fulfilled(move |()| Ok(Produced::Value(value))),
                ))
            },
            move |reason: E| {
                let f = slot_rejected
                    .borrow_mut()
                    .take()
                    .expect("settlement runs exactly one branch");
                let side = Promise::resolve(&scheduler_rejected, f()?);
                Ok(Produced::Chain(side.then(move |()| Err(reason), Err)))
            },
        )
    }

    /// Appends a continuation pair, or schedules the matching branch if the
    /// promise has already settled. Used by `then` and by chain adoption.
    pub(crate) fn subscribe(
        &self,
        on_fulfilled: Box<dyn FnOnce(V)>,
        on_rejected: Box<dyn FnOnce(E)>,
    ) {
        let snapshot: Option<Settlement<V, E>> = {
            let inner = self.inner.borrow();
            match &inner.state {
                State::Pending => None,
                State::Fulfilled(value) => Some(Settlement::Fulfilled(value.clone())),
                State::Rejected(reason) => Some(Settlement::Rejected(reason.clone())),
            }
        };
        match snapshot {
            None => {
                let mut inner = self.inner.borrow_mut();
                inner.fulfill_queue.push(on_fulfilled);
                inner.reject_queue.push(on_rejected);
            }
            Some(Settlement::Fulfilled(value)) => {
                self.scheduler.defer(move || on_fulfilled(value));
            }
            Some(Settlement::Rejected(reason)) => {
                self.scheduler.defer(move || on_rejected(reason));
            }
        }
    }

    pub(crate) fn shared(&self) -> &Shared<V, E> {
        &self.inner
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

/// External settlement handle for one promise.
///
/// Both handles are idempotent beyond the first settlement: whichever of
/// `fulfill`/`reject` lands first wins and every later call is a no-op.
pub struct Settler<V, E> {
    inner: Shared<V, E>,
    scheduler: Scheduler,
}

impl<V, E> Clone for Settler<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<V, E> fmt::Debug for Settler<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("state", &self.inner.borrow().state.observable())
            .finish()
    }
}

impl<V, E> Settler<V, E>
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    /// Settles the promise fulfilled with `value`, if still pending.
    pub fn fulfill(&self, value: V) {
        settle_fulfilled(&self.inner, &self.scheduler, value);
    }

    /// Settles the promise rejected with `reason`, if still pending.
    pub fn reject(&self, reason: E) {
        settle_rejected(&self.inner, &self.scheduler, reason);
    }

    /// Settles the promise through the resolution procedure, adopting
    /// chained promises and foreign thenables instead of storing them.
    pub fn resolve(&self, produced: Produced<V, E>) {
        resolve_produced(&self.inner, &self.scheduler, produced);
    }

    /// Returns the current observable state of the settled promise.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.observable()
    }
}
