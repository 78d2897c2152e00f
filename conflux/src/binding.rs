//! View-binding layer: derived props over stores, and action injection.
//!
//! This is glue for UI layers, not part of the dispatch core: it only
//! consumes the public store/action surface. A binding names the stores it
//! derives from ([`DerivedView`]); a [`StoreConnector`] subscribes to each of
//! their change events, recomputes the derived props whenever any of them
//! changes, and unsubscribes on teardown. [`inject_actions`] resolves a list
//! of action namespaces for a view that only needs to call actions.

use crate::action::NamespaceActions;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::store::{CHANGE, StoreHandle};
use conflux_core::SubscriptionId;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// The stores a connector subscribed on behalf of a view.
#[derive(Clone, Default)]
pub struct StoreSet {
    stores: IndexMap<String, StoreHandle>,
}

impl StoreSet {
    /// Look up one of the subscribed stores.
    pub fn get(&self, namespace: &str) -> Option<&StoreHandle> {
        self.stores.get(namespace)
    }

    /// Shortcut for a subscribed store's current snapshot.
    pub fn state(&self, namespace: &str) -> Option<Rc<Value>> {
        self.stores.get(namespace).map(StoreHandle::state)
    }

    /// Iterate the subscribed stores in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoreHandle)> {
        self.stores.iter()
    }
}

/// Capability interface for anything deriving presentation state from
/// stores.
pub trait DerivedView {
    /// The derived props computed from store state.
    type Props;

    /// The store namespaces this view derives from.
    fn store_keys(&self) -> Vec<String>;

    /// Compute the derived props from the current store snapshots.
    fn compute(&self, stores: &StoreSet) -> Self::Props;
}

struct ConnectorShared<V: DerivedView> {
    view: V,
    stores: StoreSet,
    props: RefCell<V::Props>,
}

/// Keeps a view's derived props current while connected.
///
/// Computes the props once on connect, recomputes on every change event of
/// any subscribed store, and unsubscribes when dropped or torn down.
pub struct StoreConnector<V: DerivedView> {
    shared: Rc<ConnectorShared<V>>,
    subscriptions: Vec<(StoreHandle, SubscriptionId)>,
}

impl<V> StoreConnector<V>
where
    V: DerivedView + 'static,
    V::Props: 'static,
{
    /// Subscribe `view` to its stores on `engine`.
    ///
    /// Fails with [`EngineError::UnknownStore`] if any declared store key is
    /// not registered.
    pub fn connect(view: V, engine: &Engine) -> Result<Self, EngineError> {
        let mut stores = IndexMap::new();
        for key in view.store_keys() {
            let handle = engine.store(&key)?;
            stores.insert(key, handle);
        }
        let stores = StoreSet { stores };

        let props = RefCell::new(view.compute(&stores));
        let shared = Rc::new(ConnectorShared {
            view,
            stores,
            props,
        });

        let mut subscriptions = Vec::new();
        for (_, handle) in shared.stores.iter() {
            let recompute = Rc::clone(&shared);
            let id = handle.on(CHANGE, move |_| {
                *recompute.props.borrow_mut() = recompute.view.compute(&recompute.stores);
            });
            subscriptions.push((handle.clone(), id));
        }

        Ok(Self {
            shared,
            subscriptions,
        })
    }

    /// The stores this connector subscribed.
    pub fn stores(&self) -> &StoreSet {
        &self.shared.stores
    }

    /// The latest derived props.
    pub fn props(&self) -> V::Props
    where
        V::Props: Clone,
    {
        self.shared.props.borrow().clone()
    }

    /// Unsubscribe from every store. Equivalent to dropping the connector.
    pub fn teardown(self) {}
}

impl<V: DerivedView> Drop for StoreConnector<V> {
    fn drop(&mut self) {
        for (handle, id) in self.subscriptions.drain(..) {
            handle.off(CHANGE, id);
        }
    }
}

/// Resolve action-namespace views for a component that only calls actions.
///
/// Fails with [`EngineError::UnknownNamespace`] if any namespace is not
/// registered.
pub fn inject_actions(
    engine: &Engine,
    namespaces: &[&str],
) -> Result<Vec<NamespaceActions>, EngineError> {
    namespaces
        .iter()
        .map(|namespace| engine.actions(namespace))
        .collect()
}
