//! Event pipeline tests: bus dispatch feeding the notification store the
//! same way the hub wires them.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::bus::{EventBus, EventType};
use crate::notify::NoopNotifier;
use crate::store::{NotificationStore, Severity};

fn wired() -> (Arc<EventBus>, Arc<NotificationStore>, Vec<crate::bus::Subscription>) {
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(NotificationStore::new(Arc::new(NoopNotifier)));
    let mut projections = Vec::new();
    for event_type in EventType::projected() {
        let store = Arc::clone(&store);
        let projected = event_type.clone();
        projections.push(bus.subscribe(event_type, move |payload| {
            store.apply(&projected, payload);
        }));
    }
    (bus, store, projections)
}

#[test]
fn dispatched_events_become_feed_records_newest_first() {
    let (bus, store, _subs) = wired();

    bus.dispatch(&EventType::Notification, &json!({"title": "E1"}));
    bus.dispatch(&EventType::Notification, &json!({"title": "E2"}));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.notifications.len(), 2);
    assert_eq!(snapshot.notifications[0].title, "E2");
    assert_eq!(snapshot.notifications[1].title, "E1");
    assert_eq!(snapshot.unread_count, 2);
}

#[test]
fn unread_count_stays_consistent_through_a_full_session() {
    let (bus, store, _subs) = wired();

    for n in 0..3 {
        bus.dispatch(&EventType::Notification, &json!({ "title": format!("n{n}") }));
    }
    assert_eq!(store.len(), 3);
    assert_eq!(store.unread_count(), 3);

    let second = store.snapshot().notifications[1].id.clone();
    store.mark_as_read(&second);
    assert_eq!(store.len(), 3);
    assert_eq!(store.unread_count(), 2);

    store.mark_all_as_read();
    assert_eq!(store.unread_count(), 0);

    store.clear_all();
    assert_eq!(store.len(), 0);
    assert_eq!(store.unread_count(), 0);
}

#[test]
fn unwired_event_types_leave_the_feed_untouched() {
    let (bus, store, _subs) = wired();

    let invoked = bus.dispatch(&EventType::Custom("telemetry".into()), &json!({"noise": true}));
    assert_eq!(invoked, 0);
    assert!(store.is_empty());
}

#[test]
fn each_event_type_lands_with_its_own_kind() {
    let (bus, store, _subs) = wired();

    bus.dispatch(&EventType::WeatherAlert, &json!({}));
    bus.dispatch(&EventType::WorkOrderCreated, &json!({}));
    bus.dispatch(&EventType::SystemAlert, &json!({}));
    bus.dispatch(&EventType::Notification, &json!({}));

    let kinds: Vec<String> = store
        .snapshot()
        .notifications
        .iter()
        .map(|r| r.kind.clone())
        .collect();
    assert_eq!(
        kinds,
        vec!["general", "system_alert", "work_order", "weather_alert"]
    );
}

#[test]
fn severity_coercion_applies_through_the_pipeline() {
    let (bus, store, _subs) = wired();

    bus.dispatch(&EventType::SystemAlert, &json!({"severity": "bogus"}));
    bus.dispatch(&EventType::SystemAlert, &json!({}));
    bus.dispatch(&EventType::SystemAlert, &json!({"severity": "error"}));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.notifications[0].severity, Severity::Error);
    assert_eq!(snapshot.notifications[1].severity, Severity::Info);
    assert_eq!(snapshot.notifications[2].severity, Severity::Info);
}

#[test]
fn unsubscribing_the_projection_stops_the_feed_only() {
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(NotificationStore::new(Arc::new(NoopNotifier)));

    let feed_store = Arc::clone(&store);
    let feed = bus.subscribe(EventType::Notification, move |payload| {
        feed_store.apply(&EventType::Notification, payload);
    });
    let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let _other = bus.subscribe(EventType::Notification, move |_payload| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    bus.dispatch(&EventType::Notification, &json!({}));
    feed.unsubscribe();
    bus.dispatch(&EventType::Notification, &json!({}));

    assert_eq!(store.len(), 1);
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 2);
}
