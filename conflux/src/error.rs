//! Engine-level error type.
//!
//! [`EngineError`] layers registry and configuration failures over the core
//! error types, with `#[from]` conversions so dispatch-layer errors propagate
//! through `?` unchanged.

use conflux_core::{BoxError, DispatchError, PayloadError};
use thiserror::Error;

/// Top-level error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An error occurred during a dispatch cycle.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A payload could not be constructed.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// No store is registered under this namespace.
    #[error("unknown store namespace: {0}")]
    UnknownStore(String),

    /// No action namespace is registered under this name.
    #[error("unknown action namespace: {0}")]
    UnknownNamespace(String),

    /// The namespace exists but has no action of this name.
    #[error("unknown action: {namespace}.{name}")]
    UnknownAction {
        /// The namespace that was searched.
        namespace: String,
        /// The action name that was not found.
        name: String,
    },

    /// A store namespace appeared twice in one configuration.
    #[error("store namespace already registered: {0}")]
    DuplicateStore(String),

    /// An action namespace appeared twice in one configuration.
    #[error("action namespace already registered: {0}")]
    DuplicateNamespace(String),

    /// A reaction map nested deeper than the supported single level.
    #[error("reaction map for store {store} nests deeper than one level under {namespace}")]
    ReactionDepth {
        /// The store whose setup routine returned the map.
        store: String,
        /// The nested namespace key holding a further nested map.
        namespace: String,
    },

    /// A handle outlived the engine it was created from.
    #[error("engine has been dropped")]
    EngineGone,

    /// An action creator failed synchronously.
    #[error("action creator failed")]
    Creator(#[source] BoxError),

    /// An action creator's asynchronous follow-up failed.
    #[error("asynchronous follow-up failed")]
    FollowUp(#[source] BoxError),
}
