//! Reaction maps and handler resolution.
//!
//! A store's setup routine returns a [`ReactionMap`]: the declaration of
//! which actions the store reacts to. Entries are a tagged union: a reaction
//! function, or one nested map keyed by a foreign namespace so a store can
//! react to another namespace's actions. Nesting is one level deep;
//! [`Engine::create`] rejects anything deeper.
//!
//! Resolution for a payload `{namespace, name}` against a store:
//!
//! 1. If the payload namespace is the store's own namespace and a top-level
//!    reaction named `name` exists, that reaction fires.
//! 2. Otherwise, if a nested map is keyed by the payload namespace and holds
//!    a reaction named `name`, that reaction fires.
//! 3. Otherwise nothing fires; most stores ignore most actions, and that is
//!    not an error.
//!
//! [`Engine::create`]: crate::Engine::create

use crate::error::EngineError;
use conflux_core::{ActionPayload, BoxError};
use indexmap::IndexMap;
use serde_json::Value;

/// A reaction to one action.
///
/// Receives the payload arguments. Returning `Ok(Some(partial))` merges the
/// partial into the store state exactly as an explicit
/// [`StoreContext::set_state`] call would; returning `Ok(None)` means the
/// reaction already wrote (or chose not to write) state itself. An error
/// aborts the dispatch cycle and propagates to the action caller.
///
/// [`StoreContext::set_state`]: crate::StoreContext::set_state
pub type ReactionFn = Box<dyn Fn(&[Value]) -> Result<Option<Value>, BoxError>>;

/// One entry in a reaction map.
pub enum ReactionEntry {
    /// A reaction keyed directly by action name.
    Reaction(ReactionFn),
    /// Reactions to another namespace's actions, keyed by that namespace.
    Namespace(ReactionMap),
}

/// The reactions a store declares, in declaration order.
#[derive(Default)]
pub struct ReactionMap {
    entries: IndexMap<String, ReactionEntry>,
}

impl ReactionMap {
    /// Create an empty reaction map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a reaction to the action `name`.
    pub fn on(
        mut self,
        name: impl Into<String>,
        reaction: impl Fn(&[Value]) -> Result<Option<Value>, BoxError> + 'static,
    ) -> Self {
        self.entries
            .insert(name.into(), ReactionEntry::Reaction(Box::new(reaction)));
        self
    }

    /// Declare reactions to actions of a foreign `namespace`.
    pub fn namespace(mut self, namespace: impl Into<String>, reactions: ReactionMap) -> Self {
        self.entries
            .insert(namespace.into(), ReactionEntry::Namespace(reactions));
        self
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&String, &ReactionEntry)> {
        self.entries.iter()
    }

    /// Find the reaction that fires for `payload`, if any.
    pub(crate) fn resolve(
        &self,
        store_namespace: &str,
        payload: &ActionPayload,
    ) -> Option<&ReactionFn> {
        if payload.namespace() == store_namespace {
            if let Some(ReactionEntry::Reaction(reaction)) = self.entries.get(payload.name()) {
                return Some(reaction);
            }
        }
        if let Some(ReactionEntry::Namespace(nested)) = self.entries.get(payload.namespace()) {
            if let Some(ReactionEntry::Reaction(reaction)) = nested.entries.get(payload.name()) {
                return Some(reaction);
            }
        }
        None
    }

    /// Reject maps nested deeper than one level.
    pub(crate) fn validate_depth(&self, store: &str) -> Result<(), EngineError> {
        for (key, entry) in &self.entries {
            if let ReactionEntry::Namespace(nested) = entry {
                for (_, inner) in &nested.entries {
                    if matches!(inner, ReactionEntry::Namespace(_)) {
                        return Err(EngineError::ReactionDepth {
                            store: store.to_string(),
                            namespace: key.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
