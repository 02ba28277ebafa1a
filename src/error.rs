//! Error types.
//!
//! Rejection reasons are caller-defined: the promise machinery is generic
//! over `E` and never invents reasons of its own, with one exception. A
//! chain that tries to adopt itself is a programming error that must reject
//! rather than deadlock, so every reason type carries a conversion from
//! [`CycleError`].

use thiserror::Error;

/// A promise was asked to adopt its own eventual value.
///
/// Produced when a handler returns the very promise its chaining call
/// created, directly or through any depth of thenable nesting. Rejecting
/// with this error keeps the chain observable instead of pending forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Error)]
#[error("chaining cycle detected: a promise cannot adopt itself")]
pub struct CycleError;
