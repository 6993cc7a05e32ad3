//! Notification records and severity classification.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bus::EventType;

/// Coarse classification used for styling and prioritizing a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Success => "success",
        }
    }

    /// Parse a wire value, coercing anything unrecognized to `Info`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            "success" => Severity::Success,
            _ => Severity::Info,
        }
    }
}

/// One delivered, user-facing alert.
///
/// Immutable except for the `read` flag. `created_at` is assigned at
/// receipt, not at origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    /// Free-form source classification (`general`, `weather_alert`,
    /// `work_order`, `system_alert`, or a custom wire tag).
    pub kind: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub read: bool,
    pub created_at: String,
}

impl NotificationRecord {
    /// Project an inbound event into a record.
    ///
    /// Field extraction is event-type-specific; missing or malformed fields
    /// fall back to defaults rather than failing the projection.
    pub fn project(event_type: &EventType, payload: &Value) -> Self {
        let severity = payload
            .get("severity")
            .and_then(Value::as_str)
            .map(Severity::from_wire)
            .unwrap_or_default();

        let (kind, fallback_title) = match event_type {
            EventType::Notification => ("general", "Notification"),
            EventType::WeatherAlert => ("weather_alert", "Weather alert"),
            EventType::WorkOrderCreated => ("work_order", "New work order"),
            EventType::SystemAlert => ("system_alert", "System alert"),
            EventType::Custom(tag) => (tag.as_str(), "Notification"),
        };

        let title = text_field(payload, "title").unwrap_or_else(|| fallback_title.to_string());
        let message = text_field(payload, "message")
            .or_else(|| text_field(payload, "description"))
            .or_else(|| text_field(payload, "summary"))
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            title,
            message,
            severity,
            read: false,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

fn text_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}
