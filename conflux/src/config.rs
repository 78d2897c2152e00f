//! Engine configuration: the one-shot declaration of namespaces.
//!
//! A [`Config`] collects action-namespace and store-namespace setup routines
//! in declaration order. [`Engine::create`] consumes it once: all action
//! namespaces are set up first, then all store namespaces, so placeholder
//! synthesis can see every explicit action.
//!
//! [`Engine::create`]: crate::Engine::create

use crate::action::{CreatorMap, NamespaceActions};
use crate::reaction::ReactionMap;
use crate::store::StoreContext;

/// How one action namespace is authored.
pub enum ActionSetup {
    /// A plain mapping of name to creator.
    Creators(CreatorMap),
    /// A factory receiving a live view of its own, still-filling namespace,
    /// so creators can reference siblings that register after them (resolved
    /// lazily at call time).
    Factory(Box<dyn FnOnce(NamespaceActions) -> CreatorMap>),
}

impl ActionSetup {
    /// Author the namespace through a factory.
    pub fn factory(factory: impl FnOnce(NamespaceActions) -> CreatorMap + 'static) -> Self {
        Self::Factory(Box::new(factory))
    }
}

impl From<CreatorMap> for ActionSetup {
    fn from(creators: CreatorMap) -> Self {
        Self::Creators(creators)
    }
}

/// A store's setup routine: receives the private context, seeds state,
/// returns the store's reaction map.
pub type StoreSetup = Box<dyn FnOnce(StoreContext) -> ReactionMap>;

/// Declarative engine configuration, consumed once by `Engine::create`.
#[derive(Default)]
pub struct Config {
    actions: Vec<(String, ActionSetup)>,
    stores: Vec<(String, StoreSetup)>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the creators of one action namespace.
    pub fn actions(mut self, namespace: impl Into<String>, setup: impl Into<ActionSetup>) -> Self {
        self.actions.push((namespace.into(), setup.into()));
        self
    }

    /// Declare one store namespace.
    pub fn stores(
        mut self,
        namespace: impl Into<String>,
        setup: impl FnOnce(StoreContext) -> ReactionMap + 'static,
    ) -> Self {
        self.stores.push((namespace.into(), Box::new(setup)));
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, ActionSetup)>, Vec<(String, StoreSetup)>) {
        (self.actions, self.stores)
    }
}
