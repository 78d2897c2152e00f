//! Testing utilities.
//!
//! Reusable spies for store and engine events:
//!
//! - [`RecordingSubscriber`]: records every `"change"` snapshot of one store
//! - [`DispatchLog`]: records every payload seen on the `"dispatch"` event

use crate::engine::{DISPATCH, Engine};
use crate::store::{CHANGE, StoreHandle};
use conflux_core::{ActionPayload, SubscriptionId};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Records every change snapshot a store emits.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingSubscriber::attach(&engine.store("message")?);
/// engine.action("message", "add_message")?.call(vec![json!("hi")])?;
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingSubscriber {
    states: Rc<RefCell<Vec<Rc<Value>>>>,
    subscription: Option<(StoreHandle, SubscriptionId)>,
}

impl RecordingSubscriber {
    /// Subscribe to `store`'s change event and start recording.
    pub fn attach(store: &StoreHandle) -> Self {
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        let id = store.on(CHANGE, move |state| sink.borrow_mut().push(Rc::clone(state)));
        Self {
            states,
            subscription: Some((store.clone(), id)),
        }
    }

    /// All recorded snapshots, in emission order.
    pub fn states(&self) -> Vec<Rc<Value>> {
        self.states.borrow().clone()
    }

    /// The most recent snapshot, if any change has been emitted.
    pub fn last(&self) -> Option<Rc<Value>> {
        self.states.borrow().last().cloned()
    }

    /// Number of change events recorded.
    pub fn count(&self) -> usize {
        self.states.borrow().len()
    }

    /// Stop recording.
    pub fn detach(&mut self) {
        if let Some((store, id)) = self.subscription.take() {
            store.off(CHANGE, id);
        }
    }
}

impl Drop for RecordingSubscriber {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Records every payload announced on the engine's dispatch event.
pub struct DispatchLog {
    payloads: Rc<RefCell<Vec<Rc<ActionPayload>>>>,
    subscription: Option<SubscriptionId>,
}

impl DispatchLog {
    /// Subscribe to `engine`'s dispatch event and start recording.
    ///
    /// The log holds the subscription id; drop the log (or call
    /// [`detach`](DispatchLog::detach) with the engine) to stop recording.
    pub fn attach(engine: &Engine) -> Self {
        let payloads = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&payloads);
        let id = engine.on(DISPATCH, move |payload| {
            sink.borrow_mut().push(Rc::clone(payload));
        });
        Self {
            payloads,
            subscription: Some(id),
        }
    }

    /// All recorded payloads, in dispatch order.
    pub fn payloads(&self) -> Vec<Rc<ActionPayload>> {
        self.payloads.borrow().clone()
    }

    /// The `namespace.name` labels of the recorded payloads, in order.
    pub fn labels(&self) -> Vec<String> {
        self.payloads
            .borrow()
            .iter()
            .map(|payload| payload.to_string())
            .collect()
    }

    /// Number of payloads recorded.
    pub fn count(&self) -> usize {
        self.payloads.borrow().len()
    }

    /// Stop recording.
    pub fn detach(&mut self, engine: &Engine) {
        if let Some(id) = self.subscription.take() {
            engine.off(DISPATCH, id);
        }
    }
}
