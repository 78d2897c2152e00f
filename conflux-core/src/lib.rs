//! # conflux-core
//!
//! Primitives for the conflux dispatch engine.
//!
//! This crate has minimal dependencies and holds the pieces with non-trivial
//! invariants; the `conflux` crate layers the registries, stores and action
//! surface on top.
//!
//! - [`ActionPayload`] - one action occurrence (namespace, name, arguments),
//!   immutable once constructed
//! - [`Dispatcher`] - the ordered callback list and the single-cycle
//!   execution model with wait-for dependency resolution
//! - [`Emitter`] - named-event publish/subscribe with synchronous emission
//!
//! # Execution model
//!
//! Everything here is single-threaded and synchronous. A dispatch cycle runs
//! to completion before [`Dispatcher::dispatch`] returns; nested dispatch is
//! a caller error, never queued. [`Dispatcher::wait_for`] resolves same-cycle
//! dependencies by eager out-of-order invocation and fails on dependency
//! cycles.
//!
//! # Error types
//!
//! - [`PayloadError`] - malformed payload construction
//! - [`DispatchError`] - nested dispatch, dependency cycles, callback failure

#![warn(missing_docs)]
#![deny(clippy::wildcard_imports)]

mod dispatcher;
mod emitter;
mod error;
mod payload;

pub use dispatcher::{DispatchCallback, DispatchToken, Dispatcher};
pub use emitter::{Emitter, SubscriptionId};
pub use error::{BoxError, DispatchError, PayloadError};
pub use payload::ActionPayload;
