//! Event type constants and the subscription key type.
//!
//! Single source of truth for the wire tags the upstream feed uses and for
//! which event types the notification store projects into the feed.

use std::fmt;

// ---------------------------------------------------------------------------
// Wire tags
// ---------------------------------------------------------------------------

pub const EVENT_NOTIFICATION: &str = "notification";
pub const EVENT_WEATHER_ALERT: &str = "weather_alert";
pub const EVENT_WORK_ORDER_CREATED: &str = "work_order_created";
pub const EVENT_SYSTEM_ALERT: &str = "system_alert";

// ---------------------------------------------------------------------------
// Event type
// ---------------------------------------------------------------------------

/// Semantic category of an inbound message, used as the subscription key on
/// the event bus.
///
/// The set is open-ended: tags this build does not recognize map to
/// [`EventType::Custom`] and route like any other key, so new upstream event
/// types never fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A direct user-facing notification.
    Notification,
    /// Weather service alert relevant to scheduled operations.
    WeatherAlert,
    /// A work order was created upstream.
    WorkOrderCreated,
    /// Platform/system level alert.
    SystemAlert,
    /// Any tag not in the list above, preserved verbatim.
    Custom(String),
}

impl EventType {
    /// Parse a wire tag. Unknown tags are preserved as `Custom`.
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            EVENT_NOTIFICATION => EventType::Notification,
            EVENT_WEATHER_ALERT => EventType::WeatherAlert,
            EVENT_WORK_ORDER_CREATED => EventType::WorkOrderCreated,
            EVENT_SYSTEM_ALERT => EventType::SystemAlert,
            other => EventType::Custom(other.to_string()),
        }
    }

    /// The tag used on the wire and in logs.
    pub fn wire_name(&self) -> &str {
        match self {
            EventType::Notification => EVENT_NOTIFICATION,
            EventType::WeatherAlert => EVENT_WEATHER_ALERT,
            EventType::WorkOrderCreated => EVENT_WORK_ORDER_CREATED,
            EventType::SystemAlert => EVENT_SYSTEM_ALERT,
            EventType::Custom(tag) => tag,
        }
    }

    /// The event types the notification store projects into feed records.
    pub fn projected() -> [EventType; 4] {
        [
            EventType::Notification,
            EventType::WeatherAlert,
            EventType::WorkOrderCreated,
            EventType::SystemAlert,
        ]
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        for tag in [
            EVENT_NOTIFICATION,
            EVENT_WEATHER_ALERT,
            EVENT_WORK_ORDER_CREATED,
            EVENT_SYSTEM_ALERT,
        ] {
            let parsed = EventType::from_wire(tag);
            assert!(!matches!(parsed, EventType::Custom(_)));
            assert_eq!(parsed.wire_name(), tag);
        }
    }

    #[test]
    fn unknown_tag_becomes_custom_and_round_trips() {
        let parsed = EventType::from_wire("equipment_offline");
        assert_eq!(parsed, EventType::Custom("equipment_offline".to_string()));
        assert_eq!(parsed.wire_name(), "equipment_offline");
        assert_eq!(parsed.to_string(), "equipment_offline");
    }

    #[test]
    fn projected_types_are_the_known_set() {
        let projected = EventType::projected();
        assert_eq!(projected.len(), 4);
        assert!(projected.iter().all(|t| !matches!(t, EventType::Custom(_))));
    }
}
