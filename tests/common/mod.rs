//! Shared test harness: a minimal in-process upstream feed server.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::protocol::Message;

/// WebSocket server standing in for the production event feed.
///
/// Every accepted connection replays frames pushed through [`push`] from the
/// moment it connected. [`drop_connections`] severs live sessions without a
/// close handshake, which is how an unexpected upstream failure looks to the
/// client.
pub struct MockUpstream {
    addr: SocketAddr,
    frame_tx: broadcast::Sender<String>,
    drop_tx: broadcast::Sender<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream addr");
        let (frame_tx, _) = broadcast::channel::<String>(64);
        let (drop_tx, _) = broadcast::channel(4);

        let frames = frame_tx.clone();
        let drops = drop_tx.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let mut frames = frames.subscribe();
                let mut drops = drops.subscribe();
                tokio::spawn(async move {
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let (mut write, mut read) = ws.split();
                    loop {
                        tokio::select! {
                            frame = frames.recv() => match frame {
                                Ok(text) => {
                                    if write.send(Message::Text(text.into())).await.is_err() {
                                        return;
                                    }
                                }
                                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                                Err(broadcast::error::RecvError::Closed) => return,
                            },
                            // Sever without a close frame.
                            _ = drops.recv() => return,
                            inbound = read.next() => {
                                if inbound.is_none() {
                                    return;
                                }
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            frame_tx,
            drop_tx,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push a well-formed envelope to every live connection.
    pub fn push(&self, event_type: &str, payload: serde_json::Value) {
        let frame = serde_json::json!({ "eventType": event_type, "payload": payload }).to_string();
        let _ = self.frame_tx.send(frame);
    }

    /// Push a raw text frame verbatim, valid or not.
    pub fn push_raw(&self, frame: &str) {
        let _ = self.frame_tx.send(frame.to_string());
    }

    /// Sever every live connection.
    pub fn drop_connections(&self) {
        let _ = self.drop_tx.send(());
    }
}
