//! Troth: a deferred-value primitive with explicit scheduling.
//!
//! # Overview
//!
//! A [`Promise`] is a container for the eventual result of an operation:
//! still pending, fulfilled with a value, or rejected with a reason. Chains
//! built with [`then`](Promise::then), [`catch`](Promise::catch), and
//! [`finally`](Promise::finally) register continuations that run once the
//! value is known; the [`combinator`] module composes many promises into
//! one; the [`adopt`] module resolves whatever a handler produced — a plain
//! value, a nested promise, or a foreign [`Thenable`] — into a settlement.
//!
//! # Core Guarantees
//!
//! - **Settle once**: `Pending → Fulfilled` or `Pending → Rejected`, both
//!   terminal; every later settlement attempt is a no-op.
//! - **Never synchronous**: continuations always run strictly after the
//!   code that registered or triggered them, through the injected
//!   [`Scheduler`], in FIFO registration order per promise.
//! - **Adoption is defensive**: foreign thenables that signal twice, signal
//!   both ways, or fail mid-handshake get exactly one signal honored.
//! - **Cycles reject**: a chain that adopts itself rejects with
//!   [`CycleError`] instead of deadlocking.
//! - **No panics across boundaries**: initializer and handler failures are
//!   explicit `Result`s, converted to rejections where they occur.
//!
//! # Module Structure
//!
//! - [`scheduler`]: the deferred-execution capability and a deterministic
//!   FIFO implementation
//! - [`promise`]: the settle-once state machine and chaining operators
//! - [`adopt`]: the resolution procedure and thenable probing
//! - [`combinator`]: `all`, `race`, `all_settled`
//! - [`error`](mod@error): the distinguished cycle error
//!
//! # Example
//!
//! ```
//! use troth::{CycleError, FifoScheduler, Produced, Promise, Scheduler, combinator};
//!
//! let driver = FifoScheduler::new();
//! let scheduler = Scheduler::new(driver.clone());
//!
//! let (slow, settler) = Promise::<i32, CycleError>::parts(&scheduler);
//! let total = combinator::all(
//!     &scheduler,
//!     vec![Produced::Value(1), Produced::Chain(slow), Produced::Value(3)],
//! )
//! .then_fulfilled(|values| Ok(Produced::Value(values.iter().sum::<i32>())));
//!
//! settler.fulfill(2);
//! driver.run_until_idle();
//! assert_eq!(total.settlement().unwrap().value(), Some(&6));
//! ```
//!
//! The model is single-threaded cooperative: nothing here is `Send`, no
//! locks are taken, and there is no cancellation — a chain runs to
//! settlement or stays pending forever.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]

pub mod adopt;
pub mod combinator;
pub mod error;
pub mod promise;
pub mod scheduler;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_logging;

pub use adopt::{Handled, OnAdopted, OnRejected, Produced, ThenCapability, ThenInvoke, Thenable};
pub use error::CycleError;
pub use promise::{Promise, PromiseState, Settlement, Settler};
pub use scheduler::{Continuation, FifoScheduler, Schedule, Scheduler};
