//! # conflux - Synchronous Action/Store Dispatch Engine
//!
//! `conflux` coordinates state-holding **stores** reacting to named
//! **actions**, with explicit same-cycle ordering between stores when one
//! store's reaction must run before another's. Everything happens in one
//! synchronous execution context: calling an action runs a full dispatch
//! cycle through every matched store before the call returns.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use conflux::{Config, Engine, ReactionMap};
//! use serde_json::json;
//!
//! let engine = Engine::create(Config::new().stores("message", |store| {
//!     store.set_state(json!({ "messages": [] }));
//!     ReactionMap::new().on("add_message", {
//!         let store = store.clone();
//!         move |args| {
//!             let mut messages = store.state()["messages"].as_array().cloned().unwrap_or_default();
//!             messages.extend(args.iter().cloned());
//!             Ok(Some(json!({ "messages": messages })))
//!         }
//!     })
//! }))?;
//!
//! // "add_message" had no explicit action, so a placeholder was synthesized.
//! engine.action("message", "add_message")?.call(vec![json!("hello")])?;
//! assert_eq!(engine.store("message")?.state()["messages"], json!(["hello"]));
//! ```
//!
//! ## Architecture
//!
//! - **Dispatch core** ([`Dispatcher`], re-exported from `conflux-core`):
//!   ordered callbacks, at-most-once invocation per cycle, wait-for
//!   dependency resolution, reentrancy and cycle errors.
//! - **Stores** ([`StoreContext`] / [`StoreHandle`]): one immutable snapshot
//!   per store, replaced wholesale by shallow merge; change events suppressed
//!   during setup seeding.
//! - **Actions** ([`CreatorMap`] / [`ActionHandle`]): explicit creators,
//!   alias/delegate shorthands, bound [`DispatchHandle`]s with sibling
//!   access, deferred [`Completion`] per call.
//! - **Placeholder synthesis**: store reactions without an explicit action
//!   get a pass-through action registered automatically.
//! - **Bindings** ([`binding`]): derived-props connectors for UI layers,
//!   outside the dispatch core.

#![warn(missing_docs)]
#![deny(clippy::wildcard_imports)]

mod action;
mod config;
mod engine;
mod error;
mod reaction;
mod store;

pub mod binding;
pub mod testing;

pub use action::{
    ActionHandle, Completion, Creator, CreatorFn, CreatorMap, DispatchHandle, FollowUp,
    NamespaceActions,
};
pub use config::{ActionSetup, Config, StoreSetup};
pub use engine::{DISPATCH, Engine};
pub use error::EngineError;
pub use reaction::{ReactionEntry, ReactionFn, ReactionMap};
pub use store::{CHANGE, IntoStoreKeys, StoreContext, StoreHandle};

// Core primitives, re-exported for consumers that only need this crate.
pub use conflux_core::{
    ActionPayload, BoxError, DispatchCallback, DispatchError, DispatchToken, Dispatcher, Emitter,
    PayloadError, SubscriptionId,
};

/// Prelude module - common imports for conflux.
///
/// # Usage
///
/// ```rust,ignore
/// use conflux::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ActionHandle, ActionPayload, BoxError, CHANGE, Completion, Config, CreatorMap, DISPATCH,
        DispatchError, DispatchHandle, Engine, EngineError, ReactionMap, StoreContext, StoreHandle,
    };
}
