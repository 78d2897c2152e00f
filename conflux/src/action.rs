//! Action creators, bound dispatch handles and deferred completion.
//!
//! An action namespace is authored as a [`CreatorMap`]: explicit creator
//! functions plus two shorthand forms, [`alias`] (dispatch a payload under
//! this same name) and [`delegate`] (dispatch under another name, arguments
//! unchanged). Shorthands are resolved once at registration into the same
//! pass-through representation placeholder actions use, so call sites never
//! branch on authoring style.
//!
//! Each creator runs with a [`DispatchHandle`] bound to its namespace and
//! name: calling [`DispatchHandle::dispatch`] emits the payload into exactly
//! one dispatch cycle, and the handle also reaches sibling public actions and
//! sibling dispatch handles in the same namespace.
//!
//! [`alias`]: CreatorMap::alias
//! [`delegate`]: CreatorMap::delegate

use crate::engine::EngineInner;
use crate::error::EngineError;
use conflux_core::BoxError;
use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

/// An asynchronous follow-up started by a creator.
///
/// The follow-up settles strictly after the initiating cycle completes; any
/// action it dispatches is a wholly separate cycle.
pub type FollowUp = LocalBoxFuture<'static, Result<(), BoxError>>;

/// An explicit action creator.
///
/// Invoked with the bound dispatch handle and the caller's arguments.
/// Returning `Ok(Some(follow_up))` defers completion of the public action
/// call until the follow-up settles.
pub type CreatorFn = dyn Fn(&DispatchHandle, &[Value]) -> Result<Option<FollowUp>, BoxError>;

/// One authored creator entry, before registration resolves it.
pub enum Creator {
    /// An explicit creator function.
    Explicit(Rc<CreatorFn>),
    /// Dispatch a payload under this entry's own name (pass-through).
    SelfAlias,
    /// Dispatch a payload under another name, forwarding arguments unchanged.
    DelegateTo(String),
}

/// The creators of one action namespace, in declaration order.
#[derive(Default)]
pub struct CreatorMap {
    entries: IndexMap<String, Creator>,
}

impl CreatorMap {
    /// Create an empty creator map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit creator for `name`.
    pub fn creator(
        mut self,
        name: impl Into<String>,
        creator: impl Fn(&DispatchHandle, &[Value]) -> Result<Option<FollowUp>, BoxError> + 'static,
    ) -> Self {
        self.entries
            .insert(name.into(), Creator::Explicit(Rc::new(creator)));
        self
    }

    /// Register a pass-through action dispatching under its own name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Creator::SelfAlias);
        self
    }

    /// Register an action delegating to `target` in the same namespace.
    pub fn delegate(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries
            .insert(name.into(), Creator::DelegateTo(target.into()));
        self
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, Creator)> {
        self.entries.into_iter()
    }
}

/// Resolved form of a creator: a uniform callable.
#[derive(Clone)]
pub(crate) enum ActionKind {
    /// Run an explicit creator function.
    Creator(Rc<CreatorFn>),
    /// Dispatch a payload under the carried name, arguments unchanged.
    Forward(Rc<str>),
}

/// A dispatch function bound to one namespace and action name.
#[derive(Clone)]
pub struct DispatchHandle {
    engine: Weak<EngineInner>,
    namespace: Rc<str>,
    name: Rc<str>,
}

impl DispatchHandle {
    pub(crate) fn new(engine: Weak<EngineInner>, namespace: Rc<str>, name: Rc<str>) -> Self {
        Self {
            engine,
            namespace,
            name,
        }
    }

    /// The namespace this handle dispatches into.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The action name this handle dispatches as.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit a payload for this namespace and name into one dispatch cycle.
    ///
    /// All matched store callbacks run before this returns.
    pub fn dispatch(&self, args: Vec<Value>) -> Result<(), EngineError> {
        self.engine()?
            .dispatch_action(&self.namespace, &self.name, args)
    }

    /// The dispatch handle for a differently named action in this namespace.
    ///
    /// Dispatching through it emits that action's payload without running its
    /// public creator.
    pub fn sibling(&self, name: &str) -> DispatchHandle {
        DispatchHandle {
            engine: self.engine.clone(),
            namespace: Rc::clone(&self.namespace),
            name: Rc::from(name),
        }
    }

    /// The public action callables of this namespace, resolved lazily.
    pub fn actions(&self) -> NamespaceActions {
        NamespaceActions {
            engine: self.engine.clone(),
            namespace: Rc::clone(&self.namespace),
        }
    }

    fn engine(&self) -> Result<Rc<EngineInner>, EngineError> {
        self.engine.upgrade().ok_or(EngineError::EngineGone)
    }
}

/// A lazy view of one namespace's public actions.
///
/// Name resolution happens at call time, against the engine's registry, so a
/// creator may hold this view before its siblings finish registering.
#[derive(Clone)]
pub struct NamespaceActions {
    engine: Weak<EngineInner>,
    namespace: Rc<str>,
}

impl NamespaceActions {
    pub(crate) fn new(engine: Weak<EngineInner>, namespace: &str) -> Self {
        Self {
            engine,
            namespace: Rc::from(namespace),
        }
    }

    /// The namespace this view resolves against.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Look up the public action `name` in this namespace.
    pub fn action(&self, name: &str) -> Result<ActionHandle, EngineError> {
        self.engine()?.action_handle(&self.namespace, name)
    }

    /// The action names currently registered in this namespace.
    pub fn names(&self) -> Result<Vec<String>, EngineError> {
        self.engine()?.action_names(&self.namespace)
    }

    fn engine(&self) -> Result<Rc<EngineInner>, EngineError> {
        self.engine.upgrade().ok_or(EngineError::EngineGone)
    }
}

/// A public, callable action.
#[derive(Clone)]
pub struct ActionHandle {
    kind: ActionKind,
    dispatch: DispatchHandle,
}

impl ActionHandle {
    pub(crate) fn from_creator(
        creator: Creator,
        engine: Weak<EngineInner>,
        namespace: Rc<str>,
        name: &str,
    ) -> Self {
        let kind = match creator {
            Creator::Explicit(creator) => ActionKind::Creator(creator),
            Creator::SelfAlias => ActionKind::Forward(Rc::from(name)),
            Creator::DelegateTo(target) => ActionKind::Forward(Rc::from(target.as_str())),
        };
        Self {
            kind,
            dispatch: DispatchHandle::new(engine, namespace, Rc::from(name)),
        }
    }

    /// A synthesized pass-through action for a store reaction with no
    /// explicit action.
    pub(crate) fn placeholder(engine: Weak<EngineInner>, namespace: Rc<str>, name: &str) -> Self {
        Self {
            kind: ActionKind::Forward(Rc::from(name)),
            dispatch: DispatchHandle::new(engine, namespace, Rc::from(name)),
        }
    }

    /// The namespace this action belongs to.
    pub fn namespace(&self) -> &str {
        self.dispatch.namespace()
    }

    /// The action's public name.
    pub fn name(&self) -> &str {
        self.dispatch.name()
    }

    /// Invoke the action.
    ///
    /// The dispatch cycle (and every matched store callback) completes before
    /// this returns. Synchronous failures (nested dispatch, a wait-for
    /// cycle, a reaction or creator error) come back as `Err`. On `Ok`, the
    /// returned [`Completion`] resolves immediately unless the creator
    /// started an asynchronous follow-up, in which case it settles with the
    /// follow-up.
    pub fn call(&self, args: Vec<Value>) -> Result<Completion, EngineError> {
        match &self.kind {
            ActionKind::Forward(target) => {
                if **target == *self.dispatch.name() {
                    self.dispatch.dispatch(args)?;
                } else {
                    self.dispatch.sibling(target).dispatch(args)?;
                }
                Ok(Completion::ready())
            }
            ActionKind::Creator(creator) => {
                match creator(&self.dispatch, &args).map_err(unwrap_engine_error)? {
                    Some(follow_up) => Ok(Completion::deferred(follow_up)),
                    None => Ok(Completion::ready()),
                }
            }
        }
    }
}

/// Creators usually fail by propagating an [`EngineError`] from the dispatch
/// handle; hand that back intact instead of double-wrapping it.
fn unwrap_engine_error(error: BoxError) -> EngineError {
    match error.downcast::<EngineError>() {
        Ok(engine_error) => *engine_error,
        Err(other) => EngineError::Creator(other),
    }
}

/// Deferred completion of one action call.
///
/// Resolves immediately when the creator performed no asynchronous
/// follow-up; otherwise resolves (or fails with [`EngineError::FollowUp`])
/// once the follow-up settles. Fused: polling after completion yields
/// `Ok(())`.
pub struct Completion {
    follow_up: Option<FollowUp>,
}

impl Completion {
    pub(crate) fn ready() -> Self {
        Self { follow_up: None }
    }

    pub(crate) fn deferred(follow_up: FollowUp) -> Self {
        Self {
            follow_up: Some(follow_up),
        }
    }

    /// Whether the completion has already settled.
    pub fn is_settled(&self) -> bool {
        self.follow_up.is_none()
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Future for Completion {
    type Output = Result<(), EngineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let Some(follow_up) = this.follow_up.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        match follow_up.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                this.follow_up = None;
                Poll::Ready(result.map_err(|error| match error.downcast::<EngineError>() {
                    Ok(engine_error) => *engine_error,
                    Err(other) => EngineError::FollowUp(other),
                }))
            }
        }
    }
}
