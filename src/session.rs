//! Chat session — protocol interpretation and lifecycle state machine.
//!
//! DESIGN
//! ======
//! `ChatSession` owns everything mutable about one connection: the bounded
//! log, the connection state, and the single pending-outbound slot. It talks
//! to the outside only through its UI collaborator and its `Link`, so the
//! whole state machine runs without a socket in tests.
//!
//! States mirror the transport: Connecting → Open → Closed. Closed is
//! terminal; frames that arrive after it are dropped and sends are refused.

use frames::{CodecError, InboundFrame};
use tracing::{debug, info, warn};

use crate::history::MessageLog;
use crate::transport::{ConnectionState, Link, Payload, TransportError, TransportEvent};
use crate::ui::{InputSurface, Notifier, Renderer};

pub const CONNECTION_LOST: &str = "chat disconnected; the server may have gone down";
pub const DISCONNECTED_PLACEHOLDER: &str = "chat disconnected.";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("chat is not connected")]
    NotConnected,
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

pub struct ChatSession<U, L> {
    ui: U,
    link: L,
    log: MessageLog,
    state: ConnectionState,
    /// Last message this client sent and has not yet seen echoed back.
    /// Each send overwrites it; the matching echo clears it.
    pending: Option<String>,
}

impl<U, L> ChatSession<U, L>
where
    U: Renderer + Notifier + InputSurface,
    L: Link,
{
    pub fn new(ui: U, link: L) -> Self {
        Self { ui, link, log: MessageLog::new(), state: ConnectionState::Connecting, pending: None }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn into_ui(self) -> U {
        self.ui
    }

    /// Route one transport lifecycle event to its handler.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Message(payload) => self.dispatch(payload.as_bytes()),
            TransportEvent::Close => self.on_close(),
        }
    }

    pub fn on_open(&mut self) {
        if self.state != ConnectionState::Connecting {
            warn!(state = ?self.state, "chat: open ignored");
            return;
        }
        self.state = ConnectionState::Open;
        self.ui.enable_input();
        info!("chat: connected");
    }

    /// Interpret one raw inbound frame. Malformed or unknown frames are logged
    /// and dropped; the session stays alive.
    pub fn dispatch(&mut self, raw: &[u8]) {
        if self.state == ConnectionState::Closed {
            debug!("chat: frame after close dropped");
            return;
        }

        let frame = match frames::decode_frame(raw) {
            Ok(frame) => frame,
            Err(CodecError::UnknownType(frame_type)) => {
                debug!(frame_type, "chat: unknown frame type ignored");
                return;
            }
            Err(e) => {
                warn!(error = %e, len = raw.len(), "chat: invalid inbound frame");
                return;
            }
        };

        match frame {
            InboundFrame::Error(message) => self.ui.error(&message),
            InboundFrame::InitialSnapshot(entries) => {
                debug!(count = entries.len(), "chat: snapshot");
                self.log.replace(entries);
                self.ui.render_log(self.log.entries());
            }
            InboundFrame::Append(entry) => {
                let own_echo = self.pending.as_deref() == Some(entry.message.as_str());
                let message = entry.message.clone();
                self.log.push(entry);
                self.ui.render_log(self.log.entries());
                if own_echo {
                    self.pending = None;
                } else {
                    self.ui.notify(&message);
                }
            }
            InboundFrame::Info(message) => self.ui.success(&message),
        }
    }

    /// Send one chat message. Blank input is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] unless the session is open, or
    /// the transport's error if the link refuses the payload.
    pub fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if self.state != ConnectionState::Open {
            return Err(SessionError::NotConnected);
        }

        self.link.send(Payload::Text(text.to_owned()))?;
        self.pending = Some(text.to_owned());
        self.ui.clear_input();
        Ok(())
    }

    pub fn on_close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        info!("chat: connection lost");

        self.ui.error(CONNECTION_LOST);
        self.ui.disable_input(DISCONNECTED_PLACEHOLDER);
        // Stops the keep-alive if the socket is somehow still up.
        self.link.close();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
