//! The deferred-execution capability.
//!
//! Promises never invoke a stored continuation synchronously. Every
//! continuation — whether registered before or after settlement — is
//! submitted to a [`Scheduler`], which guarantees it runs strictly after
//! the current synchronous execution, in FIFO submission order. That is
//! the entire contract; the core assumes nothing else about timing.
//!
//! The capability is injected rather than ambient so the whole crate is
//! testable with a deterministic, manually-advanced queue. One such
//! implementation ships here: [`FifoScheduler`].

mod fifo;

pub use fifo::FifoScheduler;

use std::rc::Rc;

/// A queued unit of deferred work.
pub type Continuation = Box<dyn FnOnce()>;

/// The deferred-execution primitive.
///
/// Implementations must run submitted continuations after the current
/// synchronous execution completes, preserving FIFO order among
/// continuations submitted through the same instance.
pub trait Schedule {
    /// Submits a continuation to run later.
    fn defer(&self, continuation: Continuation);

    /// Returns the number of continuations waiting to run.
    fn pending(&self) -> usize;
}

/// A shared handle to a [`Schedule`] implementation.
///
/// Cloned into every promise so that chains and combinators inherit the
/// scheduler of the promise they derive from.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<dyn Schedule>,
}

impl Scheduler {
    /// Wraps a shared schedule implementation.
    pub fn new(inner: Rc<dyn Schedule>) -> Self {
        Self { inner }
    }

    /// Submits a closure to run after the current synchronous execution.
    pub fn defer<F>(&self, continuation: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner.defer(Box::new(continuation));
    }

    /// Returns the number of continuations waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.inner.pending())
            .finish()
    }
}
