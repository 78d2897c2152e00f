//! The engine: registries, construction, and the dispatch entry point.
//!
//! [`Engine::create`] consumes a [`Config`] and builds everything in one
//! pass: action namespaces first, then store namespaces. Each store
//! contributes one dispatcher callback that resolves the store's reaction
//! for a payload and applies its state write; reactions lacking an explicit
//! action get a placeholder action synthesized for them.
//!
//! After construction the registries are frozen in shape; only store state
//! values change, once per matched dispatch cycle. The engine is an explicit
//! instance: create as many as you like, nothing here is process-global.

use crate::action::{ActionHandle, NamespaceActions};
use crate::config::{ActionSetup, Config, StoreSetup};
use crate::error::EngineError;
use crate::reaction::{ReactionEntry, ReactionMap};
use crate::store::{StoreContext, StoreHandle};
use conflux_core::{ActionPayload, DispatchToken, Dispatcher, Emitter, SubscriptionId};
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Event name emitted once for every completed dispatch cycle.
pub const DISPATCH: &str = "dispatch";

pub(crate) struct EngineInner {
    pub(crate) dispatcher: Dispatcher,
    stores: RefCell<IndexMap<String, StoreHandle>>,
    actions: RefCell<IndexMap<String, IndexMap<String, ActionHandle>>>,
    emitter: Emitter<Rc<ActionPayload>>,
}

impl EngineInner {
    fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            stores: RefCell::new(IndexMap::new()),
            actions: RefCell::new(IndexMap::new()),
            emitter: Emitter::new(),
        }
    }

    /// Route one payload through a full dispatch cycle, then announce it on
    /// the process-wide `"dispatch"` event.
    pub(crate) fn dispatch_action(
        &self,
        namespace: &str,
        name: &str,
        args: Vec<Value>,
    ) -> Result<(), EngineError> {
        let payload = Rc::new(ActionPayload::new(namespace, name, args)?);
        tracing::debug!(namespace, name, "dispatching");
        self.dispatcher.dispatch(Rc::clone(&payload))?;
        self.emitter.emit(DISPATCH, &payload);
        Ok(())
    }

    pub(crate) fn store_token(&self, namespace: &str) -> Result<DispatchToken, EngineError> {
        self.store_handle(namespace).map(|handle| handle.token())
    }

    pub(crate) fn store_handle(&self, namespace: &str) -> Result<StoreHandle, EngineError> {
        self.stores
            .borrow()
            .get(namespace)
            .cloned()
            .ok_or_else(|| EngineError::UnknownStore(namespace.to_string()))
    }

    pub(crate) fn action_handle(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ActionHandle, EngineError> {
        let actions = self.actions.borrow();
        let entries = actions
            .get(namespace)
            .ok_or_else(|| EngineError::UnknownNamespace(namespace.to_string()))?;
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownAction {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    pub(crate) fn action_names(&self, namespace: &str) -> Result<Vec<String>, EngineError> {
        self.actions
            .borrow()
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .ok_or_else(|| EngineError::UnknownNamespace(namespace.to_string()))
    }

    fn has_namespace(&self, namespace: &str) -> bool {
        self.actions.borrow().contains_key(namespace)
    }
}

/// The dispatch engine: action and store registries around one dispatcher.
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Build an engine from `config`.
    ///
    /// Action namespaces are set up first, then store namespaces, each in
    /// declaration order. Fails on duplicate namespaces and on reaction maps
    /// nested deeper than one level.
    pub fn create(config: Config) -> Result<Self, EngineError> {
        let inner = Rc::new(EngineInner::new());
        let (actions, stores) = config.into_parts();
        for (namespace, setup) in actions {
            setup_actions(&inner, namespace, setup)?;
        }
        for (namespace, setup) in stores {
            setup_store(&inner, namespace, setup)?;
        }
        Ok(Self { inner })
    }

    /// Look up a store's public handle.
    pub fn store(&self, namespace: &str) -> Result<StoreHandle, EngineError> {
        self.inner.store_handle(namespace)
    }

    /// The registered store namespaces, in registration order.
    pub fn store_names(&self) -> Vec<String> {
        self.inner.stores.borrow().keys().cloned().collect()
    }

    /// Look up one public action.
    pub fn action(&self, namespace: &str, name: &str) -> Result<ActionHandle, EngineError> {
        self.inner.action_handle(namespace, name)
    }

    /// A lazy view of one action namespace.
    pub fn actions(&self, namespace: &str) -> Result<NamespaceActions, EngineError> {
        if !self.inner.has_namespace(namespace) {
            return Err(EngineError::UnknownNamespace(namespace.to_string()));
        }
        Ok(NamespaceActions::new(Rc::downgrade(&self.inner), namespace))
    }

    /// Subscribe to an engine event (only [`DISPATCH`] is ever emitted).
    ///
    /// The `"dispatch"` event fires once per completed cycle, for every
    /// payload regardless of namespace, after the cycle's store callbacks
    /// have all run.
    pub fn on(
        &self,
        event: &str,
        callback: impl FnMut(&Rc<ActionPayload>) + 'static,
    ) -> SubscriptionId {
        self.inner.emitter.on(event, callback)
    }

    /// Subscribe to a single emission of an engine event.
    pub fn once(
        &self,
        event: &str,
        callback: impl FnMut(&Rc<ActionPayload>) + 'static,
    ) -> SubscriptionId {
        self.inner.emitter.once(event, callback)
    }

    /// Remove an engine event subscription.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        self.inner.emitter.off(event, id)
    }
}

fn setup_actions(
    inner: &Rc<EngineInner>,
    namespace: String,
    setup: ActionSetup,
) -> Result<(), EngineError> {
    if inner.actions.borrow().contains_key(&namespace) {
        return Err(EngineError::DuplicateNamespace(namespace));
    }
    // The namespace entry exists before any creator runs, so a factory can
    // hold a live view of its own still-filling namespace.
    inner
        .actions
        .borrow_mut()
        .insert(namespace.clone(), IndexMap::new());

    let creators = match setup {
        ActionSetup::Creators(creators) => creators,
        ActionSetup::Factory(factory) => {
            factory(NamespaceActions::new(Rc::downgrade(inner), &namespace))
        }
    };

    let shared_namespace: Rc<str> = Rc::from(namespace.as_str());
    let mut entries = IndexMap::new();
    for (name, creator) in creators.into_entries() {
        let handle = ActionHandle::from_creator(
            creator,
            Rc::downgrade(inner),
            Rc::clone(&shared_namespace),
            &name,
        );
        entries.insert(name, handle);
    }
    tracing::debug!(namespace = %namespace, actions = entries.len(), "action namespace registered");
    inner.actions.borrow_mut().insert(namespace, entries);
    Ok(())
}

fn setup_store(
    inner: &Rc<EngineInner>,
    namespace: String,
    setup: StoreSetup,
) -> Result<(), EngineError> {
    if inner.stores.borrow().contains_key(&namespace) {
        return Err(EngineError::DuplicateStore(namespace));
    }

    let context = StoreContext::new(namespace.clone(), Rc::downgrade(inner));
    let reactions = setup(context.clone());
    reactions.validate_depth(&namespace)?;
    // Setup has seeded its initial state; from here on set_state notifies.
    context.activate();

    let reactions = Rc::new(reactions);
    let token = {
        let context = context.clone();
        let reactions = Rc::clone(&reactions);
        let store_namespace = namespace.clone();
        inner.dispatcher.register(Rc::new(move |payload| {
            let Some(reaction) = reactions.resolve(&store_namespace, payload) else {
                return Ok(());
            };
            if let Some(partial) = reaction(payload.args())? {
                context.set_state(partial);
            }
            Ok(())
        }))
    };

    synthesize_placeholders(inner, &namespace, &reactions, None);
    tracing::debug!(store = %namespace, %token, "store registered");
    inner
        .stores
        .borrow_mut()
        .insert(namespace, StoreHandle::from_context(&context, token));
    Ok(())
}

/// For every reaction with no explicit action of the same name, register a
/// pass-through action dispatching that payload directly. Nested reaction
/// maps attribute their placeholders to the nested namespace key. Existing
/// explicit actions are never overwritten.
fn synthesize_placeholders(
    inner: &Rc<EngineInner>,
    store_namespace: &str,
    reactions: &ReactionMap,
    namespace_override: Option<&str>,
) {
    let target = namespace_override.unwrap_or(store_namespace);
    for (name, entry) in reactions.entries() {
        match entry {
            ReactionEntry::Reaction(_) => {
                let mut registry = inner.actions.borrow_mut();
                let namespace_actions = registry.entry(target.to_string()).or_default();
                if !namespace_actions.contains_key(name) {
                    tracing::trace!(namespace = target, action = %name, "placeholder action synthesized");
                    namespace_actions.insert(
                        name.clone(),
                        ActionHandle::placeholder(Rc::downgrade(inner), Rc::from(target), name),
                    );
                }
            }
            ReactionEntry::Namespace(nested) => {
                synthesize_placeholders(inner, store_namespace, nested, Some(name));
            }
        }
    }
}
