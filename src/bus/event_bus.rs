use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use super::event_types::EventType;

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

struct HandlerEntry {
    id: u64,
    handler: Handler,
}

type Registry = Arc<DashMap<EventType, Vec<HandlerEntry>>>;

/// In-process publish/subscribe registry routing typed events to zero or
/// more handlers.
///
/// Dispatch is synchronous: handlers registered for one event type observe
/// events in the exact order `dispatch` is called, and a handler that panics
/// is isolated so the remaining handlers still run.
pub struct EventBus {
    registry: Registry,
    next_id: AtomicU64,
    seq: AtomicI64,
}

/// Handle for one registration.
///
/// Calling [`Subscription::unsubscribe`] removes exactly this handler,
/// leaving sibling registrations for the same event type untouched. Dropping
/// the handle without calling it leaves the handler registered for the
/// lifetime of the bus.
#[must_use = "dropping the handle does not unsubscribe; call unsubscribe()"]
pub struct Subscription {
    registry: Registry,
    event_type: EventType,
    id: u64,
}

impl Subscription {
    /// Remove this registration from the bus.
    pub fn unsubscribe(self) {
        if let Some(mut entries) = self.registry.get_mut(&self.event_type) {
            entries.retain(|entry| entry.id != self.id);
        }
    }

    /// The event type this subscription listens to.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            seq: AtomicI64::new(0),
        }
    }

    /// Register `handler` to be invoked with the payload of every event of
    /// `event_type` dispatched after this call returns.
    pub fn subscribe<F>(&self, event_type: EventType, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .entry(event_type.clone())
            .or_default()
            .push(HandlerEntry {
                id,
                handler: Arc::new(handler),
            });
        Subscription {
            registry: Arc::clone(&self.registry),
            event_type,
            id,
        }
    }

    /// Synchronously invoke every handler registered for `event_type`, in
    /// registration order. Returns the number of handlers invoked.
    ///
    /// Dispatching a type nobody subscribed to is not an error. A handler
    /// that panics is logged and does not prevent the remaining handlers
    /// from running.
    pub fn dispatch(&self, event_type: &EventType, payload: &Value) -> usize {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        // Snapshot the handler list so subscribe/unsubscribe from within a
        // handler cannot deadlock, and so a handler added mid-dispatch fully
        // misses the current dispatch.
        let handlers: Vec<Handler> = match self.registry.get(event_type) {
            Some(entries) => entries
                .iter()
                .map(|entry| Arc::clone(&entry.handler))
                .collect(),
            None => Vec::new(),
        };

        if handlers.is_empty() {
            tracing::trace!(event_type = %event_type, seq, "no subscribers for event");
            return 0;
        }

        for handler in &handlers {
            let handler = handler.as_ref();
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                tracing::error!(
                    event_type = %event_type,
                    seq,
                    "event handler panicked; continuing with remaining handlers"
                );
            }
        }
        handlers.len()
    }

    /// Number of live registrations for `event_type`.
    pub fn subscriber_count(&self, event_type: &EventType) -> usize {
        self.registry
            .get(event_type)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
