//! Store state cells, private contexts and public handles.
//!
//! Each store owns one state snapshot: an `Rc<serde_json::Value>` replaced
//! wholesale on every update, never mutated in place. The previous snapshot
//! stays valid and distinct, so consumers can detect change by
//! `Rc::ptr_eq`.
//!
//! The [`StoreContext`] is handed to exactly one setup routine and lives on
//! inside that store's reaction closures; the [`StoreHandle`] is the shared
//! read-only surface (snapshot, change subscription, dispatch token).

use crate::engine::EngineInner;
use crate::error::EngineError;
use conflux_core::{DispatchToken, Emitter, SubscriptionId};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Event name emitted when a store's state is replaced.
pub const CHANGE: &str = "change";

pub(crate) struct StoreShared {
    namespace: String,
    state: RefCell<Rc<Value>>,
    active: Cell<bool>,
    emitter: Emitter<Rc<Value>>,
    engine: Weak<EngineInner>,
}

/// Private store context, owned by one store's setup routine.
///
/// Cheap to clone; reactions typically capture their own clone. State written
/// during the setup routine seeds the store silently; only after setup
/// returns does [`set_state`] start emitting [`CHANGE`].
///
/// [`set_state`]: StoreContext::set_state
#[derive(Clone)]
pub struct StoreContext {
    shared: Rc<StoreShared>,
}

impl StoreContext {
    pub(crate) fn new(namespace: String, engine: Weak<EngineInner>) -> Self {
        Self {
            shared: Rc::new(StoreShared {
                namespace,
                state: RefCell::new(Rc::new(Value::Object(Map::new()))),
                active: Cell::new(false),
                emitter: Emitter::new(),
                engine,
            }),
        }
    }

    /// The namespace this store is registered under.
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// The current state snapshot.
    pub fn state(&self) -> Rc<Value> {
        Rc::clone(&self.shared.state.borrow())
    }

    /// Merge `partial` into the state, producing a new snapshot.
    ///
    /// When both the current state and `partial` are JSON objects the merge
    /// is shallow: keys in `partial` win, keys absent from it are preserved.
    /// Any other combination replaces the state wholesale. The public
    /// snapshot is updated synchronously; [`CHANGE`] is emitted only once the
    /// store's setup routine has returned.
    pub fn set_state(&self, partial: Value) {
        let next = Rc::new(merge(&self.shared.state.borrow(), partial));
        *self.shared.state.borrow_mut() = Rc::clone(&next);
        tracing::trace!(store = %self.shared.namespace, "state replaced");
        if self.shared.active.get() {
            self.shared.emitter.emit(CHANGE, &next);
        }
    }

    /// Have the named stores' reactions to the current payload run first.
    ///
    /// Accepts one key or many. Each key is translated to its store's
    /// dispatch token; an unknown key fails with
    /// [`EngineError::UnknownStore`], and a dependency cycle fails the
    /// dispatch. Callable only while a cycle is running.
    pub fn wait_for<K: IntoStoreKeys>(&self, keys: K) -> Result<(), EngineError> {
        let engine = self.engine()?;
        let keys = keys.into_store_keys();
        let mut tokens = Vec::with_capacity(keys.len());
        for key in &keys {
            tokens.push(engine.store_token(key)?);
        }
        engine.dispatcher.wait_for(&tokens)?;
        Ok(())
    }

    /// Look up another store's public handle, for cross-store reads.
    pub fn store(&self, namespace: &str) -> Result<StoreHandle, EngineError> {
        self.engine()?.store_handle(namespace)
    }

    /// One-time toggle: from now on `set_state` emits change events.
    pub(crate) fn activate(&self) {
        self.shared.active.set(true);
    }

    fn engine(&self) -> Result<Rc<EngineInner>, EngineError> {
        self.shared.engine.upgrade().ok_or(EngineError::EngineGone)
    }
}

fn merge(current: &Value, partial: Value) -> Value {
    match (current, partial) {
        (Value::Object(current), Value::Object(partial)) => {
            let mut merged = current.clone();
            for (key, value) in partial {
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, partial) => partial,
    }
}

/// Public, read-only store surface shared by all consumers.
#[derive(Clone)]
pub struct StoreHandle {
    shared: Rc<StoreShared>,
    token: DispatchToken,
}

impl StoreHandle {
    pub(crate) fn from_context(context: &StoreContext, token: DispatchToken) -> Self {
        Self {
            shared: Rc::clone(&context.shared),
            token,
        }
    }

    /// The namespace this store is registered under.
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// The current state snapshot.
    pub fn state(&self) -> Rc<Value> {
        Rc::clone(&self.shared.state.borrow())
    }

    /// The store's dispatch token, for other stores' wait-for declarations.
    pub fn token(&self) -> DispatchToken {
        self.token
    }

    /// Subscribe to an event (only [`CHANGE`] is ever emitted).
    pub fn on(&self, event: &str, callback: impl FnMut(&Rc<Value>) + 'static) -> SubscriptionId {
        self.shared.emitter.on(event, callback)
    }

    /// Subscribe to a single emission of an event.
    pub fn once(&self, event: &str, callback: impl FnMut(&Rc<Value>) + 'static) -> SubscriptionId {
        self.shared.emitter.once(event, callback)
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        self.shared.emitter.off(event, id)
    }
}

/// One store key or several, for [`StoreContext::wait_for`].
pub trait IntoStoreKeys {
    /// Convert into the list of store namespaces to wait on.
    fn into_store_keys(self) -> Vec<String>;
}

impl IntoStoreKeys for &str {
    fn into_store_keys(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoStoreKeys for String {
    fn into_store_keys(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoStoreKeys for &[&str] {
    fn into_store_keys(self) -> Vec<String> {
        self.iter().map(|key| key.to_string()).collect()
    }
}

impl<const N: usize> IntoStoreKeys for [&str; N] {
    fn into_store_keys(self) -> Vec<String> {
        self.iter().map(|key| key.to_string()).collect()
    }
}

impl IntoStoreKeys for Vec<String> {
    fn into_store_keys(self) -> Vec<String> {
        self
    }
}
