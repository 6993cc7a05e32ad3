//! Event system for real-time upstream-to-consumer routing.
//!
//! The event bus provides:
//! - Publish-subscribe routing keyed by [`EventType`]
//! - Per-subscription unsubscribe that leaves sibling handlers untouched
//! - Panic isolation so one misbehaving consumer cannot starve the rest
//!
//! # Architecture
//!
//! Events flow upstream → connection manager → `EventBus` → handlers. The
//! connection's reader task decodes each frame and dispatches it
//! synchronously, so handlers for a given event type observe events in
//! arrival order.

mod event_bus;
mod event_types;

pub use event_bus::{EventBus, Subscription};
pub use event_types::{
    EventType, EVENT_NOTIFICATION, EVENT_SYSTEM_ALERT, EVENT_WEATHER_ALERT,
    EVENT_WORK_ORDER_CREATED,
};
