//! Shared frame model and JSON codec for the chat WS transport.
//!
//! This crate owns the wire representation exchanged with the chat server.
//! Server-to-client frames are JSON text envelopes of the form
//! `{ "type": <int>, "value": <payload> }`. Client-to-server traffic carries no
//! envelope: chat text goes out verbatim and the keep-alive is a single byte.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The binary heartbeat sent to keep idle-timeout proxies from dropping the socket.
pub const KEEPALIVE_PAYLOAD: [u8; 1] = [0];

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes are not a JSON envelope with `type` and `value`.
    #[error("failed to decode json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The `type` integer on the wire does not map to a known [`FrameType`].
    #[error("unknown frame type: {0}")]
    UnknownType(i64),
    /// The `value` does not have the shape its [`FrameType`] requires.
    #[error("invalid value for {frame_type:?} frame")]
    InvalidValue { frame_type: FrameType },
}

/// One line of chat history, stamped by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Message body as typed by the sender.
    #[serde(rename = "msg")]
    pub message: String,
    /// Server-formatted timestamp. The client never fabricates one.
    #[serde(rename = "date")]
    pub timestamp: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self { message: message.into(), timestamp: timestamp.into() }
    }
}

/// Closed set of frame tags shared by contract with the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameType {
    /// Server-side failure surfaced to the user.
    Error,
    /// Full history replacing whatever the client holds.
    InitialSnapshot,
    /// One new entry to append to the history.
    Append,
    /// Informational notice.
    Info,
}

impl FrameType {
    /// Convert frame type into its wire integer.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Error => 0,
            Self::InitialSnapshot => 1,
            Self::Append => 2,
            Self::Info => 3,
        }
    }

    /// Parse a frame type from its wire integer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] for values outside the enumeration.
    pub fn from_i64(value: i64) -> Result<Self, CodecError> {
        match value {
            0 => Ok(Self::Error),
            1 => Ok(Self::InitialSnapshot),
            2 => Ok(Self::Append),
            3 => Ok(Self::Info),
            other => Err(CodecError::UnknownType(other)),
        }
    }
}

/// A decoded server-to-client frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundFrame {
    Error(String),
    InitialSnapshot(Vec<LogEntry>),
    Append(LogEntry),
    Info(String),
}

impl InboundFrame {
    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Error(_) => FrameType::Error,
            Self::InitialSnapshot(_) => FrameType::InitialSnapshot,
            Self::Append(_) => FrameType::Append,
            Self::Info(_) => FrameType::Info,
        }
    }
}

/// Envelope as it appears on the wire.
#[derive(Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    frame_type: i64,
    value: Value,
}

/// Decode a JSON text frame into an [`InboundFrame`].
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed envelopes,
/// [`CodecError::UnknownType`] for tags outside the enumeration and
/// [`CodecError::InvalidValue`] when the payload shape does not match the tag.
pub fn decode_frame(raw: &[u8]) -> Result<InboundFrame, CodecError> {
    let wire: WireFrame = serde_json::from_slice(raw)?;
    let frame_type = FrameType::from_i64(wire.frame_type)?;
    let invalid = |_: serde_json::Error| CodecError::InvalidValue { frame_type };

    match frame_type {
        FrameType::Error => serde_json::from_value(wire.value).map(InboundFrame::Error).map_err(invalid),
        FrameType::InitialSnapshot => serde_json::from_value(wire.value)
            .map(InboundFrame::InitialSnapshot)
            .map_err(invalid),
        FrameType::Append => serde_json::from_value(wire.value).map(InboundFrame::Append).map_err(invalid),
        FrameType::Info => serde_json::from_value(wire.value).map(InboundFrame::Info).map_err(invalid),
    }
}

/// Encode a frame into its JSON text envelope, as the server emits it.
#[must_use]
pub fn encode_frame(frame: &InboundFrame) -> String {
    let value = match frame {
        InboundFrame::Error(msg) | InboundFrame::Info(msg) => Value::String(msg.clone()),
        InboundFrame::InitialSnapshot(entries) => Value::Array(entries.iter().map(entry_to_value).collect()),
        InboundFrame::Append(entry) => entry_to_value(entry),
    };

    serde_json::json!({ "type": frame.frame_type().as_i64(), "value": value }).to_string()
}

fn entry_to_value(entry: &LogEntry) -> Value {
    serde_json::json!({ "msg": entry.message, "date": entry.timestamp })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
