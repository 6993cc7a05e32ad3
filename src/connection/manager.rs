use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::bus::{EventBus, EventType};

use super::transport::{backoff_delay, decode_frame, Envelope};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Connection lifecycle states.
///
/// Exactly one value holds at any time for the process-wide connection, and
/// only the connection manager transitions it. Consumers observe status, not
/// transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and none desired.
    Disconnected,
    /// A handshake or reconnect attempt is in flight.
    Connecting,
    /// The upstream feed is live.
    Connected,
    /// The last attempt or session failed; a retry is scheduled.
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for the upstream connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the upstream feed.
    pub url: String,
    /// Window for the WebSocket handshake before the attempt fails.
    pub handshake_timeout: Duration,
    /// First reconnect delay; doubles per consecutive failure.
    pub backoff_base: Duration,
    /// Ceiling for the reconnect delay.
    pub backoff_max: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8970/events".to_string(),
            handshake_timeout: super::transport::DEFAULT_HANDSHAKE_TIMEOUT,
            backoff_base: super::transport::DEFAULT_BACKOFF_BASE,
            backoff_max: super::transport::DEFAULT_BACKOFF_MAX,
        }
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Owns the single upstream WebSocket connection: status, reconnection with
/// bounded backoff, inbound routing onto the event bus, and a queued
/// outbound path.
pub struct ConnectionManager {
    inner: Arc<Inner>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    config: ConnectionConfig,
    bus: Arc<EventBus>,
    status_tx: watch::Sender<ConnectionStatus>,
    /// Whether the application currently wants a connection. Flipped by
    /// `connect`/`disconnect`; the supervisor exits when it goes false.
    active_tx: watch::Sender<bool>,
    outbound: Mutex<VecDeque<Envelope>>,
    outbound_signal: Notify,
}

enum SessionEnd {
    /// `disconnect()` was called; do not reconnect.
    Deliberate,
    /// The transport failed or the remote closed; reconnect after backoff.
    Failed,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, bus: Arc<EventBus>) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let (active_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                bus,
                status_tx,
                active_tx,
                outbound: Mutex::new(VecDeque::new()),
                outbound_signal: Notify::new(),
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// Start (or keep) the supervised connection. Idempotent: a manager that
    /// is already connected or connecting is left alone.
    pub fn connect(&self) {
        let mut supervisor = self.supervisor.lock().expect("supervisor lock poisoned");
        let running = supervisor
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false);
        if running && *self.inner.active_tx.borrow() {
            return;
        }
        if let Some(stale) = supervisor.take() {
            stale.abort();
        }
        self.inner.active_tx.send_replace(true);
        let inner = Arc::clone(&self.inner);
        *supervisor = Some(tokio::spawn(async move { inner.run().await }));
    }

    /// Deliberately close the connection and suppress any pending
    /// auto-reconnect. The supervisor transitions status to `Disconnected`
    /// on its way out.
    pub fn disconnect(&self) {
        self.inner.active_tx.send_replace(false);
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Observable status stream for UI consumers.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Queue an outbound envelope. Drained while connected; silently
    /// retained otherwise — the server-push direction is primary.
    pub fn send(&self, event_type: EventType, payload: Value) {
        let envelope = Envelope {
            event_type: event_type.wire_name().to_string(),
            payload,
        };
        self.inner
            .outbound
            .lock()
            .expect("outbound queue poisoned")
            .push_back(envelope);
        self.inner.outbound_signal.notify_one();
    }

    /// Number of outbound envelopes waiting for a live connection.
    pub fn pending_outbound(&self) -> usize {
        self.inner
            .outbound
            .lock()
            .expect("outbound queue poisoned")
            .len()
    }
}

impl Inner {
    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "connection status changed");
        }
    }

    /// Supervision loop: one iteration per connection attempt, with bounded
    /// exponential backoff between failures. Exits when the application no
    /// longer wants a connection.
    async fn run(self: Arc<Self>) {
        let mut active = self.active_tx.subscribe();
        let mut attempt: u32 = 0;

        while *active.borrow() {
            self.set_status(ConnectionStatus::Connecting);

            match timeout(
                self.config.handshake_timeout,
                connect_async(self.config.url.as_str()),
            )
            .await
            {
                Ok(Ok((stream, _response))) => {
                    attempt = 0;
                    self.set_status(ConnectionStatus::Connected);
                    tracing::info!(url = %self.config.url, "connected to upstream feed");
                    match self.drive(stream, &mut active).await {
                        SessionEnd::Deliberate => break,
                        SessionEnd::Failed => self.set_status(ConnectionStatus::Error),
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(url = %self.config.url, "upstream connect failed: {e}");
                    self.set_status(ConnectionStatus::Error);
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.config.handshake_timeout.as_millis() as u64,
                        "upstream handshake timed out"
                    );
                    self.set_status(ConnectionStatus::Error);
                }
            }

            if !*active.borrow() {
                break;
            }

            let delay = backoff_delay(self.config.backoff_base, self.config.backoff_max, attempt);
            attempt = attempt.saturating_add(1);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = active.wait_for(|active| !*active) => break,
            }
        }

        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Pump one live session until it ends.
    async fn drive(
        &self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        active: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        // Anything queued while we were offline goes out first.
        if self.flush_outbound(&mut write).await.is_err() {
            return SessionEnd::Failed;
        }

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::warn!("upstream closed the connection");
                        return SessionEnd::Failed;
                    }
                    Some(Ok(other)) => {
                        tracing::debug!("ignoring non-text frame: {other:?}");
                    }
                    Some(Err(e)) => {
                        tracing::warn!("upstream read error: {e}");
                        return SessionEnd::Failed;
                    }
                },
                _ = self.outbound_signal.notified() => {
                    if self.flush_outbound(&mut write).await.is_err() {
                        return SessionEnd::Failed;
                    }
                }
                _ = async { let _ = active.wait_for(|active| !*active).await; } => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Deliberate;
                }
            }
        }
    }

    /// Decode one inbound frame and route it. Malformed frames are dropped
    /// with a diagnostic; nothing reaches consumers.
    fn handle_frame(&self, raw: &str) {
        match decode_frame(raw) {
            Ok((event_type, payload)) => {
                self.bus.dispatch(&event_type, &payload);
            }
            Err(e) => {
                tracing::warn!("dropping malformed frame: {e}");
            }
        }
    }

    async fn flush_outbound(
        &self,
        write: &mut WsSink,
    ) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        loop {
            let next = {
                self.outbound
                    .lock()
                    .expect("outbound queue poisoned")
                    .pop_front()
            };
            let Some(envelope) = next else {
                return Ok(());
            };
            match serde_json::to_string(&envelope) {
                Ok(text) => write.send(Message::Text(text.into())).await?,
                Err(e) => tracing::warn!("failed to encode outbound frame: {e}"),
            }
        }
    }
}
