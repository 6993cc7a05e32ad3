//! Upstream connection management.
//!
//! This module provides:
//! - A single supervised WebSocket connection to the upstream event feed
//! - Observable [`ConnectionStatus`] (transport errors never cross the bus
//!   boundary; consumers see status values only)
//! - Automatic reconnection with bounded exponential backoff and a
//!   handshake timeout
//! - A queued outbound path drained while connected
//!
//! The inbound direction is primary: each decoded frame is dispatched onto
//! the event bus from the single reader task, which is what gives handlers
//! their per-type FIFO ordering guarantee.

mod manager;
mod transport;

pub use manager::{ConnectionConfig, ConnectionManager, ConnectionStatus};
pub use transport::{
    DecodeError, Envelope, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_HANDSHAKE_TIMEOUT,
};
