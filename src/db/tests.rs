//! Database operations unit tests.

use chrono::Utc;
use uuid::Uuid;

use crate::store::{NotificationRecord, Severity};

use super::{queries, Database};

fn record(title: &str, severity: Severity) -> NotificationRecord {
    NotificationRecord {
        id: Uuid::new_v4().to_string(),
        kind: "general".to_string(),
        title: title.to_string(),
        message: String::new(),
        severity,
        read: false,
        created_at: Utc::now().to_rfc3339(),
    }
}

#[test]
fn insert_and_list_round_trip_newest_first() {
    let db = Database::open_in_memory().expect("in-memory DB");

    let first = record("first", Severity::Warning);
    let second = record("second", Severity::Success);
    queries::insert_notification(&db, &first).unwrap();
    queries::insert_notification(&db, &second).unwrap();

    let listed = queries::list_notifications(&db).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "second");
    assert_eq!(listed[0].severity, Severity::Success);
    assert_eq!(listed[1].title, "first");
    assert_eq!(listed[1].severity, Severity::Warning);
    assert!(!listed[0].read);
}

#[test]
fn mark_read_flips_once() {
    let db = Database::open_in_memory().expect("in-memory DB");
    let rec = record("to read", Severity::Info);
    queries::insert_notification(&db, &rec).unwrap();

    assert_eq!(queries::unread_notification_count(&db).unwrap(), 1);
    assert!(queries::mark_notification_read(&db, &rec.id).unwrap());
    assert!(!queries::mark_notification_read(&db, &rec.id).unwrap());
    assert!(!queries::mark_notification_read(&db, "missing").unwrap());
    assert_eq!(queries::unread_notification_count(&db).unwrap(), 0);

    let listed = queries::list_notifications(&db).unwrap();
    assert!(listed[0].read);
}

#[test]
fn mark_all_and_clear() {
    let db = Database::open_in_memory().expect("in-memory DB");
    for n in 0..3 {
        queries::insert_notification(&db, &record(&format!("n{n}"), Severity::Info)).unwrap();
    }

    assert_eq!(queries::mark_all_notifications_read(&db).unwrap(), 3);
    assert_eq!(queries::unread_notification_count(&db).unwrap(), 0);

    assert_eq!(queries::clear_notifications(&db).unwrap(), 3);
    assert!(queries::list_notifications(&db).unwrap().is_empty());
}

#[test]
fn migrations_apply_to_a_fresh_file_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("feed.db");

    // Open twice: the second open must see the already-applied migrations.
    {
        let db = Database::open(&path).expect("open");
        queries::insert_notification(&db, &record("persisted", Severity::Error)).unwrap();
    }
    let db = Database::open(&path).expect("re-open");
    let listed = queries::list_notifications(&db).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "persisted");
    assert_eq!(listed[0].severity, Severity::Error);
}
