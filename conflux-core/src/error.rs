//! Error types for the conflux primitives.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PayloadError`] - Rejected payload construction
//! - [`DispatchError`] - Errors during a dispatch cycle
//!
//! The engine crate layers its own error type on top of these via `#[from]`
//! conversions.

use crate::dispatcher::DispatchToken;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
///
/// The engine runs in a single synchronous execution context, so unlike the
/// usual async-framework alias this one carries no `Send + Sync` bounds.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Errors raised when constructing an action payload.
///
/// A payload with an empty namespace or name is malformed: handler resolution
/// keys on both strings, so such a payload could never match anything and is
/// rejected up front.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload namespace was empty.
    #[error("payload namespace must not be empty")]
    EmptyNamespace,

    /// The payload action name was empty.
    #[error("payload action name must not be empty")]
    EmptyName,
}

/// Errors that can occur during a dispatch cycle.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// `dispatch` was called while another cycle was already in progress.
    #[error("dispatch started while another cycle is in progress")]
    NestedDispatch,

    /// `wait_for` was called outside of a running dispatch cycle.
    #[error("wait_for called outside of a dispatch cycle")]
    NotDispatching,

    /// A token did not name a callback registered with this dispatcher.
    #[error("unknown dispatch token: {0}")]
    UnknownToken(DispatchToken),

    /// A callback waited, directly or transitively, on itself.
    #[error("circular wait_for dependency on {0}")]
    CircularDependency(DispatchToken),

    /// A registered callback returned an error, aborting the cycle.
    #[error("dispatch callback failed")]
    Callback(#[source] BoxError),
}
