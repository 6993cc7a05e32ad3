//! Wire framing and reconnect timing for the upstream feed.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::bus::EventType;

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// The WebSocket handshake must complete within this window before the
/// attempt is treated as a failure.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Base delay for reconnect backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay between reconnect attempts.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Exponential backoff with ±10% jitter, capped at `max`.
pub(crate) fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let delay_ms = (base.as_millis() as u64).saturating_mul(2_u64.pow(attempt.min(10)));
    let delay_ms = delay_ms.min(max.as_millis() as u64);
    let jittered = Duration::from_millis(delay_ms).mul_f64(rand::thread_rng().gen_range(0.9..=1.1));
    jittered.min(max)
}

// ---------------------------------------------------------------------------
// Wire frame
// ---------------------------------------------------------------------------

/// One framed message: `{ "eventType": "...", "payload": { ... } }`.
///
/// The same shape is used in both directions; `payload` defaults to JSON
/// `null` when absent so outbound acks without a body stay legal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "eventType", alias = "event_type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// Why an inbound frame could not be routed.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no eventType")]
    MissingEventType,
}

/// Decode a raw text frame into a routable (type, payload) pair.
///
/// A frame without a usable `eventType` is an error; the caller drops it
/// with a diagnostic log rather than surfacing anything to consumers.
pub(crate) fn decode_frame(raw: &str) -> Result<(EventType, Value), DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.event_type.trim().is_empty() {
        return Err(DecodeError::MissingEventType);
    }
    Ok((EventType::from_wire(&envelope.event_type), envelope.payload))
}
