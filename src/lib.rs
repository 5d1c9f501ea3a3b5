//! # wschat
//!
//! Terminal client for a websocket chat room. Keeps one connection open to
//! the server, mirrors the last few messages of the room, and sends what the
//! user types.
//!
//! The transport owns the socket and its keep-alive heartbeat; the chat
//! session interprets server frames against the `frames` protocol and drives
//! the terminal UI through small collaborator traits.

pub mod app;
pub mod config;
pub mod history;
pub mod session;
pub mod transport;
pub mod ui;
