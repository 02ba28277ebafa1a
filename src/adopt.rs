//! The resolution procedure.
//!
//! A handler does not settle its derived promise directly; it produces a
//! [`Produced`] value, and this module decides what that value means. A
//! plain value settles the target fulfilled. A same-type promise is adopted:
//! the target mirrors its eventual settlement. A foreign object is probed
//! for a `then`-shaped capability and, if one exists, adopted through it —
//! defensively, because foreign code may invoke its callbacks twice, invoke
//! both, or fail partway through the handshake.
//!
//! The procedure guarantees that chaining behaves identically whether a
//! handler returns a plain value, a promise, or any [`Thenable`], and that a
//! chain which tries to adopt itself rejects with
//! [`CycleError`](crate::CycleError) instead of hanging.

use crate::error::CycleError;
use crate::promise::{Promise, Shared, settle_fulfilled, settle_rejected};
use crate::scheduler::Scheduler;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Callback handed to a foreign thenable for the adopted-value path.
///
/// May be invoked with a nested [`Produced`]; the procedure recurses until a
/// plain value or a rejection is reached. Only the first invocation of
/// either callback has any effect.
pub type OnAdopted<V, E> = Box<dyn Fn(Produced<V, E>)>;

/// Callback handed to a foreign thenable for the rejected path.
pub type OnRejected<E> = Box<dyn Fn(E)>;

/// The callable form of a foreign `then`-capability.
///
/// Invoking it registers the two adoption callbacks with the foreign
/// object. An `Err` return models the invocation itself failing.
pub type ThenInvoke<V, E> = Box<dyn FnOnce(OnAdopted<V, E>, OnRejected<E>) -> Result<(), E>>;

/// What a handler (or initializer) produced for its derived promise.
pub enum Produced<V, E> {
    /// A plain value: settle the target fulfilled with it.
    Value(V),
    /// A same-type promise: adopt its eventual settlement.
    Chain(Promise<V, E>),
    /// A foreign object that may expose a `then`-capability.
    Foreign(Rc<dyn Thenable<V, E>>),
}

impl<V, E> fmt::Debug for Produced<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Produced::Value"),
            Self::Chain(_) => f.write_str("Produced::Chain"),
            Self::Foreign(_) => f.write_str("Produced::Foreign"),
        }
    }
}

/// Handler return type: a produced value, or the handler's own failure.
pub type Handled<V, E> = Result<Produced<V, E>, E>;

/// Result of probing a foreign object for its `then`-capability.
///
/// The three-way split makes the duck-typed probe of the reference behavior
/// an exhaustive, statically-checked branch: no capability, a callable
/// capability, or a probe that itself failed.
pub enum ThenCapability<V, E> {
    /// No callable `then`: the object stands for a plain value.
    NotThenable(V),
    /// A callable `then`-capability.
    Thenable(ThenInvoke<V, E>),
    /// Reading the capability failed; the target rejects with the reason.
    ProbeFailed(E),
}

impl<V, E> fmt::Debug for ThenCapability<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotThenable(_) => f.write_str("ThenCapability::NotThenable"),
            Self::Thenable(_) => f.write_str("ThenCapability::Thenable"),
            Self::ProbeFailed(_) => f.write_str("ThenCapability::ProbeFailed"),
        }
    }
}

/// An object that may expose a `then`-shaped capability.
///
/// Implementations are trusted for nothing: the resolution procedure guards
/// every callback with a one-shot flag and treats a failing probe or a
/// failing invocation as a rejection.
pub trait Thenable<V, E> {
    /// Probes for the `then`-capability, consuming the shared handle.
    fn then_capability(self: Rc<Self>) -> ThenCapability<V, E>;
}

/// Resolves `produced` against the target promise.
///
/// See the module docs for the full decision table. Settlement of the
/// target always goes through the settle-once entry points, so a foreign
/// thenable that signals more than once cannot re-settle it even if the
/// one-shot guard were bypassed.
pub(crate) fn resolve_produced<V, E>(target: &Shared<V, E>, scheduler: &Scheduler, produced: Produced<V, E>)
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    match produced {
        Produced::Value(value) => settle_fulfilled(target, scheduler, value),
        Produced::Chain(promise) => {
            if Rc::ptr_eq(promise.shared(), target) {
                tracing::debug!("self-adoption detected; rejecting with cycle error");
                settle_rejected(target, scheduler, E::from(CycleError));
                return;
            }
            let on_fulfilled: Box<dyn FnOnce(V)> = {
                let target = Rc::clone(target);
                let scheduler = scheduler.clone();
                Box::new(move |value| settle_fulfilled(&target, &scheduler, value))
            };
            let on_rejected: Box<dyn FnOnce(E)> = {
                let target = Rc::clone(target);
                let scheduler = scheduler.clone();
                Box::new(move |reason| settle_rejected(&target, &scheduler, reason))
            };
            promise.subscribe(on_fulfilled, on_rejected);
        }
        Produced::Foreign(foreign) => match foreign.then_capability() {
            ThenCapability::NotThenable(value) => settle_fulfilled(target, scheduler, value),
            ThenCapability::ProbeFailed(reason) => {
                tracing::debug!("then-capability probe failed; rejecting");
                settle_rejected(target, scheduler, reason);
            }
            ThenCapability::Thenable(invoke) => adopt_foreign(target, scheduler, invoke),
        },
    }
}

/// Invokes a foreign `then`-capability with one-shot guarded callbacks.
fn adopt_foreign<V, E>(target: &Shared<V, E>, scheduler: &Scheduler, invoke: ThenInvoke<V, E>)
where
    V: Clone + 'static,
    E: Clone + From<CycleError> + 'static,
{
    // First signal wins, whichever callback carries it.
    let called = Rc::new(Cell::new(false));

    let on_adopted: OnAdopted<V, E> = {
        let called = Rc::clone(&called);
        let target = Rc::clone(target);
        let scheduler = scheduler.clone();
        Box::new(move |next| {
            if called.replace(true) {
                tracing::debug!("foreign thenable signalled more than once; ignoring");
                return;
            }
            resolve_produced(&target, &scheduler, next);
        })
    };

    let on_rejected: OnRejected<E> = {
        let called = Rc::clone(&called);
        let target = Rc::clone(target);
        let scheduler = scheduler.clone();
        Box::new(move |reason| {
            if called.replace(true) {
                tracing::debug!("foreign thenable signalled more than once; ignoring");
                return;
            }
            settle_rejected(&target, &scheduler, reason);
        })
    };

    if let Err(reason) = invoke(on_adopted, on_rejected) {
        if !called.replace(true) {
            tracing::debug!("foreign then invocation failed before signalling; rejecting");
            settle_rejected(target, scheduler, reason);
        }
    }
}
