use rusqlite::params;

use crate::store::{NotificationRecord, Severity};

use super::{Database, DbError};

pub fn insert_notification(db: &Database, record: &NotificationRecord) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO notifications (id, kind, title, message, severity, is_read, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.kind,
            record.title,
            record.message,
            record.severity.as_str(),
            record.read as i64,
            record.created_at
        ],
    )?;
    Ok(())
}

/// Newest-first, matching the in-memory feed order. Ordering is by insertion
/// (`rowid`), not timestamp, so same-instant arrivals keep their arrival
/// order.
pub fn list_notifications(db: &Database) -> Result<Vec<NotificationRecord>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT id, kind, title, message, severity, is_read, created_at FROM notifications ORDER BY rowid DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(NotificationRecord {
                id: row.get(0)?,
                kind: row.get(1)?,
                title: row.get(2)?,
                message: row.get(3)?,
                severity: Severity::from_wire(&row.get::<_, String>(4)?),
                read: row.get::<_, i64>(5)? != 0,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns whether a row actually flipped from unread to read.
pub fn mark_notification_read(db: &Database, id: &str) -> Result<bool, DbError> {
    let conn = db.conn();
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND is_read = 0",
        params![id],
    )?;
    Ok(changed > 0)
}

pub fn mark_all_notifications_read(db: &Database) -> Result<usize, DbError> {
    let conn = db.conn();
    let changed = conn.execute("UPDATE notifications SET is_read = 1 WHERE is_read = 0", [])?;
    Ok(changed)
}

pub fn clear_notifications(db: &Database) -> Result<usize, DbError> {
    let conn = db.conn();
    let deleted = conn.execute("DELETE FROM notifications", [])?;
    Ok(deleted)
}

pub fn unread_notification_count(db: &Database) -> Result<i64, DbError> {
    let conn = db.conn();
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE is_read = 0",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
