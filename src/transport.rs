//! WebSocket transport — owns the single connection to the chat server.
//!
//! DESIGN
//! ======
//! `open` spawns one task that owns the socket and the keep-alive timer and
//! enters a `select!` loop:
//! - Incoming socket messages → `TransportEvent::Message`, unexamined
//! - Keep-alive tick → one-byte binary heartbeat
//! - Commands from `TransportHandle` → outbound payload or close
//!
//! Lifecycle hooks are delivered as events on a channel, in arrival order.
//! The transport never interprets payloads and never reconnects.
//!
//! LIFECYCLE
//! =========
//! 1. Connecting → handshake succeeds → `Open`
//! 2. Open → socket closes, errors, or `close()` is requested → `Close`
//! 3. A failed handshake goes straight to `Close`
//!
//! `Close` is emitted exactly once, after the keep-alive timer is dropped.

use std::time::Duration;

use frames::KEEPALIVE_PAYLOAD;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Raw frame content, passed through in either direction without inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::Text(text.into()),
            Self::Binary(bytes) => Message::Binary(bytes.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(Payload),
    Close,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket is not connected")]
    NotConnected,
}

/// Outbound side of a connection, as seen by the chat session.
pub trait Link {
    /// Forward a payload verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotConnected`] unless the connection is open.
    fn send(&self, payload: Payload) -> Result<(), TransportError>;

    /// Request the connection be closed. Safe to call more than once.
    fn close(&self);
}

enum Command {
    Send(Payload),
    Close,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cheap, cloneable handle to the transport task.
#[derive(Clone)]
pub struct TransportHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl TransportHandle {
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

impl Link for TransportHandle {
    fn send(&self, payload: Payload) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Open {
            return Err(TransportError::NotConnected);
        }
        self.commands
            .send(Command::Send(payload))
            .map_err(|_| TransportError::NotConnected)
    }

    fn close(&self) {
        // The task may already be gone; nothing left to close then.
        let _ = self.commands.send(Command::Close);
    }
}

// =============================================================================
// OPEN
// =============================================================================

/// Connect to `endpoint` in a background task.
///
/// Returns the handle for sending plus the lifecycle event stream. The
/// keep-alive timer starts here, at construction, not at handshake.
pub fn open(endpoint: &str, keepalive: Duration) -> (TransportHandle, mpsc::UnboundedReceiver<TransportEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

    let timer = keepalive_timer(keepalive);
    tokio::spawn(run_transport(endpoint.to_owned(), timer, state_tx, command_rx, event_tx));

    (TransportHandle { commands: command_tx, state: state_rx }, event_rx)
}

/// Fixed-period heartbeat timer. First tick lands one full period after creation;
/// ticks missed while busy are skipped rather than burst.
pub(crate) fn keepalive_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_transport(
    endpoint: String,
    mut keepalive: Interval,
    state: watch::Sender<ConnectionState>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    info!(%endpoint, "ws: connecting");
    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!(%endpoint, error = %e, "ws: connect failed");
            drop(keepalive);
            finish(&state, &events);
            return;
        }
    };

    state.send_replace(ConnectionState::Open);
    let _ = events.send(TransportEvent::Open);
    info!(%endpoint, "ws: connected");

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Message(Payload::Text(text.as_str().to_owned())));
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let _ = events.send(TransportEvent::Message(Payload::Binary(bytes.to_vec())));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "ws: closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "ws: recv error");
                        break;
                    }
                    None => break,
                }
            }
            _ = keepalive.tick() => {
                debug!("ws: keep-alive");
                if write.send(Message::Binary(KEEPALIVE_PAYLOAD.to_vec().into())).await.is_err() {
                    break;
                }
            }
            command = commands.recv() => {
                match command {
                    Some(Command::Send(payload)) => {
                        if let Err(e) = write.send(payload.into_message()).await {
                            warn!(error = %e, "ws: send failed");
                            break;
                        }
                    }
                    Some(Command::Close) | None => {
                        let _ = write.close().await;
                        break;
                    }
                }
            }
        }
    }

    drop(keepalive);
    finish(&state, &events);
    info!(%endpoint, "ws: disconnected");
}

fn finish(state: &watch::Sender<ConnectionState>, events: &mpsc::UnboundedSender<TransportEvent>) {
    state.send_replace(ConnectionState::Closed);
    let _ = events.send(TransportEvent::Close);
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
