//! Aggregate combinators.
//!
//! Each combinator composes a fixed collection of produced values into one
//! derived promise:
//!
//! - [`all`]: fulfill with every member value, in input order; first member
//!   failure rejects.
//! - [`race`]: settle with whichever member settles first, either way.
//! - [`all_settled`]: never reject; fulfill with an index-aligned record of
//!   every member's settlement.
//!
//! Members are [`Produced`](crate::Produced) values, so plain values,
//! promises, and foreign thenables mix freely; each is coerced through the
//! [`resolve`](crate::Promise::resolve) factory before being observed.

pub mod all;
pub mod all_settled;
pub mod race;

pub use all::all;
pub use all_settled::all_settled;
pub use race::race;
