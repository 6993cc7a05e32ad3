//! In-memory notification feed with read/unread bookkeeping.
//!
//! The store projects selected event types into [`NotificationRecord`]s,
//! keeps them newest-first, and publishes list + unread count as one atomic
//! snapshot so no observer can see the two disagree. When backed by the
//! database it hydrates the feed at startup and writes every mutation
//! through; persistence problems are logged and absorbed, never failing the
//! in-memory projection.

mod record;

pub use record::{NotificationRecord, Severity};

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::watch;

use crate::bus::EventType;
use crate::db::{queries, Database, DbError};
use crate::notify::DesktopNotifier;

/// One coherent view of the feed.
///
/// `unread_count` is always derived from `notifications` inside the same
/// critical section that mutated the list, so the two can never drift.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Newest-first.
    pub notifications: Vec<NotificationRecord>,
    pub unread_count: usize,
}

pub struct NotificationStore {
    records: Mutex<Vec<NotificationRecord>>,
    snapshot_tx: watch::Sender<StoreSnapshot>,
    notifier: Arc<dyn DesktopNotifier>,
    db: Option<Arc<Database>>,
}

impl NotificationStore {
    /// Memory-only store.
    pub fn new(notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self::build(Vec::new(), notifier, None)
    }

    /// Store backed by SQLite: hydrates the feed from disk, then writes every
    /// mutation through.
    pub fn with_database(
        db: Arc<Database>,
        notifier: Arc<dyn DesktopNotifier>,
    ) -> Result<Self, DbError> {
        let records = queries::list_notifications(&db)?;
        Ok(Self::build(records, notifier, Some(db)))
    }

    fn build(
        records: Vec<NotificationRecord>,
        notifier: Arc<dyn DesktopNotifier>,
        db: Option<Arc<Database>>,
    ) -> Self {
        let snapshot = StoreSnapshot {
            unread_count: records.iter().filter(|r| !r.read).count(),
            notifications: records.clone(),
        };
        let (snapshot_tx, _) = watch::channel(snapshot);
        Self {
            records: Mutex::new(records),
            snapshot_tx,
            notifier,
            db,
        }
    }

    /// Project one event into the feed.
    ///
    /// Never fails: persistence and desktop-notification problems are logged
    /// and absorbed. Duplicate arrivals are not deduplicated; every call
    /// produces a new record.
    pub fn apply(&self, event_type: &EventType, payload: &Value) -> NotificationRecord {
        let record = NotificationRecord::project(event_type, payload);

        if let Some(db) = &self.db {
            if let Err(e) = queries::insert_notification(db, &record) {
                tracing::warn!(id = %record.id, "failed to persist notification: {e}");
            }
        }

        {
            let mut records = self.lock();
            records.insert(0, record.clone());
            self.publish(&records);
        }

        // Best-effort side channel for direct notifications only; the in-app
        // record above is already committed regardless of what happens here.
        if matches!(event_type, EventType::Notification) {
            self.notifier
                .notify(&record.title, &record.message, record.severity);
        }

        record
    }

    /// Mark one record read. Idempotent; unknown ids are a no-op. Returns
    /// whether anything changed.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut records = self.lock();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if record.read {
            return false;
        }
        record.read = true;

        if let Some(db) = &self.db {
            if let Err(e) = queries::mark_notification_read(db, id) {
                tracing::warn!(id = %id, "failed to persist read flag: {e}");
            }
        }
        self.publish(&records);
        true
    }

    /// Mark every record read and reconcile the unread count to zero in the
    /// same step.
    pub fn mark_all_as_read(&self) {
        let mut records = self.lock();
        for record in records.iter_mut() {
            record.read = true;
        }
        if let Some(db) = &self.db {
            if let Err(e) = queries::mark_all_notifications_read(db) {
                tracing::warn!("failed to persist mark-all-read: {e}");
            }
        }
        self.publish(&records);
    }

    /// Empty the feed; the unread count resets to zero in the same step.
    pub fn clear_all(&self) {
        let mut records = self.lock();
        records.clear();
        if let Some(db) = &self.db {
            if let Err(e) = queries::clear_notifications(db) {
                tracing::warn!("failed to persist clear-all: {e}");
            }
        }
        self.publish(&records);
    }

    /// Current feed view.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Observable feed stream for UI consumers.
    pub fn watch(&self) -> watch::Receiver<StoreSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn unread_count(&self) -> usize {
        self.snapshot_tx.borrow().unread_count
    }

    pub fn len(&self) -> usize {
        self.snapshot_tx.borrow().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NotificationRecord>> {
        self.records.lock().expect("notification store poisoned")
    }

    /// Publish list + derived unread count as one value. Called while the
    /// records lock is held, so observers never see a stale count next to a
    /// fresh list.
    fn publish(&self, records: &[NotificationRecord]) {
        let snapshot = StoreSnapshot {
            unread_count: records.iter().filter(|r| !r.read).count(),
            notifications: records.to_vec(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
