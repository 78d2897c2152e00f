//! # Dispatch Core
//!
//! The ordered callback registry and the single-cycle execution model.
//!
//! A [`Dispatcher`] holds one callback per registered consumer (in practice,
//! one per store) and runs them all, in registration order, for every
//! dispatched payload. Inside a cycle a callback may call [`wait_for`] to
//! have another callback's work completed first: callbacks not yet run are
//! invoked eagerly, ahead of their natural order, and every callback runs at
//! most once per cycle.
//!
//! The execution order within a cycle is therefore a deterministic
//! topological order over the locally declared dependencies, without any
//! global ordering having to be configured.
//!
//! # Fatal conditions
//!
//! - Dispatching while a cycle is in progress ([`DispatchError::NestedDispatch`])
//! - A dependency cycle among `wait_for` declarations
//!   ([`DispatchError::CircularDependency`])
//! - Waiting outside a cycle ([`DispatchError::NotDispatching`])
//!
//! A callback error aborts the cycle and propagates to the dispatch caller;
//! the dispatcher performs no retries.
//!
//! [`wait_for`]: Dispatcher::wait_for

use crate::error::{BoxError, DispatchError};
use crate::payload::ActionPayload;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A callback registered with the dispatcher.
///
/// Callbacks receive every dispatched payload and decide themselves whether
/// it concerns them; returning an error aborts the current cycle.
pub type DispatchCallback = Rc<dyn Fn(&ActionPayload) -> Result<(), BoxError>>;

/// Opaque identifier for a registered callback.
///
/// Tokens are unique for the lifetime of the dispatcher that issued them and
/// are only meaningful for dependency declarations against that dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchToken(usize);

impl std::fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token #{}", self.0)
    }
}

/// Synchronous dispatcher with wait-for dependency resolution.
///
/// The dispatcher is single-threaded by contract: a cycle runs to completion
/// on the calling thread before [`dispatch`] returns, and [`wait_for`] is
/// ordinary function-call reentry into another callback, not a suspension
/// point.
///
/// Registration is expected to happen once, up front; registering while a
/// cycle is running is not supported.
///
/// [`dispatch`]: Dispatcher::dispatch
/// [`wait_for`]: Dispatcher::wait_for
pub struct Dispatcher {
    callbacks: RefCell<Vec<DispatchCallback>>,
    dispatching: Cell<bool>,
    pending: RefCell<Vec<bool>>,
    handled: RefCell<Vec<bool>>,
    current: RefCell<Option<Rc<ActionPayload>>>,
}

/// Resets cycle bookkeeping when a cycle ends, including on error.
struct CycleGuard<'a>(&'a Dispatcher);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.dispatching.set(false);
        self.0.current.borrow_mut().take();
        self.0.pending.borrow_mut().clear();
        self.0.handled.borrow_mut().clear();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with no registered callbacks.
    pub fn new() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
            dispatching: Cell::new(false),
            pending: RefCell::new(Vec::new()),
            handled: RefCell::new(Vec::new()),
            current: RefCell::new(None),
        }
    }

    /// Append a callback to the invocation list and return its token.
    pub fn register(&self, callback: DispatchCallback) -> DispatchToken {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks.push(callback);
        DispatchToken(callbacks.len() - 1)
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Whether a dispatch cycle is currently in progress.
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Run one dispatch cycle, invoking every registered callback once.
    ///
    /// Callbacks run in registration order except where [`wait_for`] pulls a
    /// dependency forward. The first callback error aborts the cycle and is
    /// returned as [`DispatchError::Callback`].
    ///
    /// [`wait_for`]: Dispatcher::wait_for
    pub fn dispatch(&self, payload: Rc<ActionPayload>) -> Result<(), DispatchError> {
        if self.dispatching.get() {
            return Err(DispatchError::NestedDispatch);
        }

        let count = self.callbacks.borrow().len();
        *self.pending.borrow_mut() = vec![false; count];
        *self.handled.borrow_mut() = vec![false; count];
        *self.current.borrow_mut() = Some(payload);
        self.dispatching.set(true);

        let _guard = CycleGuard(self);
        for index in 0..count {
            // Already pulled forward by a dependent's wait_for.
            if self.pending.borrow()[index] {
                continue;
            }
            self.invoke(index)?;
        }
        Ok(())
    }

    /// Complete the named callbacks before returning control to the caller.
    ///
    /// Callable only from inside a running callback. For each token not yet
    /// invoked this cycle, the callback is invoked now, recursively resolving
    /// its own `wait_for` calls. A token already completed this cycle is
    /// skipped; a token currently executing means the dependency graph has a
    /// cycle and the dispatch fails.
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        if !self.dispatching.get() {
            return Err(DispatchError::NotDispatching);
        }
        for &token in tokens {
            let index = token.0;
            if index >= self.callbacks.borrow().len() {
                return Err(DispatchError::UnknownToken(token));
            }
            if self.pending.borrow()[index] {
                if !self.handled.borrow()[index] {
                    return Err(DispatchError::CircularDependency(token));
                }
                continue;
            }
            self.invoke(index)?;
        }
        Ok(())
    }

    fn invoke(&self, index: usize) -> Result<(), DispatchError> {
        self.pending.borrow_mut()[index] = true;
        // Clone out of the short borrows so the callback is free to reenter
        // through wait_for.
        let callback = self.callbacks.borrow()[index].clone();
        let payload = self
            .current
            .borrow()
            .clone()
            .ok_or(DispatchError::NotDispatching)?;
        callback(&payload).map_err(DispatchError::Callback)?;
        self.handled.borrow_mut()[index] = true;
        Ok(())
    }
}
