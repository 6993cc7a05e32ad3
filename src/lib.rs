//! signalbox — real-time notification hub.
//!
//! One upstream WebSocket feed in, typed subscriptions and a read/unread
//! notification feed out. It handles:
//! - Upstream connection lifecycle, reconnection, and status reporting
//! - Typed publish/subscribe routing of inbound events
//! - Projection of selected events into a persistent notification feed
//!
//! # Architecture
//!
//! The hub follows a modular architecture:
//! - `connection`: WebSocket connection manager (status, backoff, framing)
//! - `bus`: event bus routing typed events to subscribed handlers
//! - `store`: notification feed with read/unread bookkeeping
//! - `notify`: best-effort desktop notification capability
//! - `db`: SQLite persistence for the feed
//!
//! Consumers construct one [`Hub`] at application start and share it by
//! reference; there is exactly one upstream connection per hub.

pub mod bus;
pub mod connection;
pub mod db;
pub mod notify;
pub mod store;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use bus::{EventBus, EventType, Subscription};
use connection::{ConnectionConfig, ConnectionManager, ConnectionStatus};
use db::Database;
use notify::{DesktopNotifier, NoopNotifier};
use store::NotificationStore;

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors surfaced while constructing the hub. Once running, nothing in the
/// core returns errors to consumers: failures are absorbed or reflected in
/// [`ConnectionStatus`].
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("{0}")]
    Db(#[from] db::DbError),
    #[error("{0}")]
    Other(String),
}

impl Serialize for HubError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Hub configuration. Defaults are suitable for local development; the
/// binary overrides them from `SIGNALBOX_*` environment variables.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Upstream feed endpoint.
    pub upstream_url: String,
    /// Where the feed database lives. `None` keeps the feed in memory only.
    pub db_path: Option<PathBuf>,
    pub handshake_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            upstream_url: "ws://127.0.0.1:8970/events".to_string(),
            db_path: None,
            handshake_timeout: connection::DEFAULT_HANDSHAKE_TIMEOUT,
            backoff_base: connection::DEFAULT_BACKOFF_BASE,
            backoff_max: connection::DEFAULT_BACKOFF_MAX,
        }
    }
}

impl HubConfig {
    /// Configuration from the environment, with the stable on-disk database
    /// path unless `SIGNALBOX_DB` overrides it.
    pub fn from_env() -> Result<Self, HubError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SIGNALBOX_UPSTREAM_URL") {
            if !url.trim().is_empty() {
                config.upstream_url = url;
            }
        }

        config.db_path = match std::env::var("SIGNALBOX_DB") {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => Some(stable_db_path()?),
        };

        if let Some(timeout) = duration_from_env("SIGNALBOX_HANDSHAKE_TIMEOUT_MS") {
            config.handshake_timeout = timeout;
        }
        if let Some(base) = duration_from_env("SIGNALBOX_BACKOFF_BASE_MS") {
            config.backoff_base = base;
        }
        if let Some(max) = duration_from_env("SIGNALBOX_BACKOFF_MAX_MS") {
            config.backoff_max = max;
        }

        Ok(config)
    }
}

fn duration_from_env(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable duration override");
            None
        }
    }
}

fn signalbox_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("SIGNALBOX_DATA_DIR") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(app_data) = std::env::var("APPDATA") {
            return PathBuf::from(app_data).join("Signalbox");
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".signalbox");
    }

    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".signalbox");
    }

    PathBuf::from(".signalbox")
}

fn stable_db_path() -> Result<PathBuf, HubError> {
    let data_dir = signalbox_data_dir();
    std::fs::create_dir_all(&data_dir).map_err(|e| {
        HubError::Other(format!(
            "failed to create data directory {}: {e}",
            data_dir.display()
        ))
    })?;
    Ok(data_dir.join("signalbox.db"))
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// The application-root context object owning the bus, the store, and the
/// single upstream connection.
pub struct Hub {
    db: Option<Arc<Database>>,
    bus: Arc<EventBus>,
    store: Arc<NotificationStore>,
    connection: ConnectionManager,
    // Held so the store's projections stay wired for the hub's lifetime.
    _projections: Vec<Subscription>,
}

impl Hub {
    /// Hub with the no-op desktop notifier.
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        Self::with_notifier(config, Arc::new(NoopNotifier))
    }

    pub fn with_notifier(
        config: HubConfig,
        notifier: Arc<dyn DesktopNotifier>,
    ) -> Result<Self, HubError> {
        let db = match &config.db_path {
            Some(path) => Some(Arc::new(Database::open(path)?)),
            None => None,
        };

        let bus = Arc::new(EventBus::new());
        let store = Arc::new(match &db {
            Some(db) => NotificationStore::with_database(Arc::clone(db), notifier)?,
            None => NotificationStore::new(notifier),
        });

        let mut projections = Vec::new();
        for event_type in EventType::projected() {
            let store = Arc::clone(&store);
            let projected = event_type.clone();
            projections.push(bus.subscribe(event_type, move |payload| {
                store.apply(&projected, payload);
            }));
        }

        let connection = ConnectionManager::new(
            ConnectionConfig {
                url: config.upstream_url.clone(),
                handshake_timeout: config.handshake_timeout,
                backoff_base: config.backoff_base,
                backoff_max: config.backoff_max,
            },
            Arc::clone(&bus),
        );

        Ok(Self {
            db,
            bus,
            store,
            connection,
            _projections: projections,
        })
    }

    /// Start the upstream connection. Idempotent.
    pub fn connect(&self) {
        self.connection.connect();
    }

    /// Deliberately close the upstream connection.
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn watch_status(&self) -> tokio::sync::watch::Receiver<ConnectionStatus> {
        self.connection.watch_status()
    }

    /// The event bus, for feature-specific consumers beyond the store.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The notification feed.
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Queue an outbound envelope for the upstream server.
    pub fn send(&self, event_type: EventType, payload: serde_json::Value) {
        self.connection.send(event_type, payload)
    }

    /// The backing database, when the hub is persistent.
    pub fn database(&self) -> Option<&Arc<Database>> {
        self.db.as_ref()
    }
}
