//! Minimal named-event publish/subscribe primitive.
//!
//! Each store carries an [`Emitter`] for its `"change"` event, and the engine
//! carries one for the process-wide `"dispatch"` event. Emission is
//! synchronous: every current subscriber runs, in subscription order, before
//! [`emit`] returns.
//!
//! [`emit`]: Emitter::emit

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Opaque identifier for one subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<T> {
    id: SubscriptionId,
    once: bool,
    callback: Rc<RefCell<dyn FnMut(&T)>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            callback: Rc::clone(&self.callback),
        }
    }
}

/// A named-event emitter carrying values of type `T`.
///
/// Subscribers are invoked synchronously, in subscription order. The
/// subscriber list is snapshotted when an emit starts: subscribing or
/// unsubscribing from inside a callback affects later emits, not the one in
/// progress. A one-shot subscriber is removed before its callback runs, so a
/// reentrant emit cannot fire it twice.
pub struct Emitter<T> {
    next_id: Cell<u64>,
    channels: RefCell<HashMap<String, Vec<Subscriber<T>>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Emitter<T> {
    /// Create an emitter with no subscribers.
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            channels: RefCell::new(HashMap::new()),
        }
    }

    /// Subscribe to `event`.
    pub fn on(&self, event: &str, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        self.subscribe(event, callback, false)
    }

    /// Subscribe to `event` for a single emission.
    pub fn once(&self, event: &str, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        self.subscribe(event, callback, true)
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        let mut channels = self.channels.borrow_mut();
        let Some(subscribers) = channels.get_mut(event) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        before != subscribers.len()
    }

    /// Emit `value` to every current subscriber of `event`.
    ///
    /// Returns the number of subscribers notified.
    pub fn emit(&self, event: &str, value: &T) -> usize {
        let snapshot: Vec<Subscriber<T>> = match self.channels.borrow().get(event) {
            Some(subscribers) => subscribers.clone(),
            None => return 0,
        };
        for subscriber in &snapshot {
            if subscriber.once {
                self.off(event, subscriber.id);
            }
            (subscriber.callback.borrow_mut())(value);
        }
        snapshot.len()
    }

    /// Number of current subscribers of `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.channels
            .borrow()
            .get(event)
            .map_or(0, |subscribers| subscribers.len())
    }

    fn subscribe(
        &self,
        event: &str,
        callback: impl FnMut(&T) + 'static,
        once: bool,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.channels
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(Subscriber {
                id,
                once,
                callback: Rc::new(RefCell::new(callback)),
            });
        id
    }
}
