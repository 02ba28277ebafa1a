//! Deterministic FIFO scheduler.
//!
//! A manually-advanced continuation queue: submissions accumulate until the
//! driver steps them, so a test can interleave registration and execution
//! and observe exactly when each continuation runs. Same submission order,
//! same execution order, every run.

use super::{Continuation, Schedule};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A deterministic, manually-advanced FIFO continuation queue.
///
/// Continuations submitted while the queue is draining land at the tail and
/// run in the same drain, so a settled chain runs to quiescence in a single
/// [`run_until_idle`](Self::run_until_idle) call.
pub struct FifoScheduler {
    queue: RefCell<VecDeque<Continuation>>,
}

impl FifoScheduler {
    /// Creates an empty scheduler, shared so it can be both driven and
    /// handed to promises.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(VecDeque::new()),
        })
    }

    /// Runs the continuation at the head of the queue.
    ///
    /// Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(continuation) => {
                continuation();
                true
            }
            None => false,
        }
    }

    /// Runs continuations until the queue is empty, including any submitted
    /// by the continuations themselves. Returns the number of continuations
    /// run.
    pub fn run_until_idle(&self) -> usize {
        let mut steps = 0;
        while self.run_next() {
            steps += 1;
        }
        tracing::trace!(steps, "scheduler drained to idle");
        steps
    }

    /// Returns the number of queued continuations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns true if no continuations are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl Schedule for FifoScheduler {
    fn defer(&self, continuation: Continuation) {
        self.queue.borrow_mut().push_back(continuation);
    }

    fn pending(&self) -> usize {
        self.len()
    }
}

impl std::fmt::Debug for FifoScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoScheduler")
            .field("queued", &self.len())
            .finish()
    }
}
