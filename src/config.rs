//! Client configuration parsed from CLI flags with environment fallbacks.

use std::time::Duration;

use clap::Parser;

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:3000";
/// Beats the 55s idle cutoff some hosting proxies enforce.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid origin (expected http:// or https://): {0}")]
    InvalidOrigin(String),
    #[error("keep-alive period must be greater than zero")]
    ZeroKeepalive,
}

#[derive(Parser, Debug)]
#[command(name = "wschat", about = "Terminal client for the websocket chat room")]
pub struct Cli {
    /// Page origin of the chat server; the websocket endpoint is derived from it.
    #[arg(long, env = "CHAT_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    #[arg(long, env = "CHAT_KEEPALIVE_SECS", default_value_t = DEFAULT_KEEPALIVE_SECS)]
    pub keepalive_secs: u64,

    /// Disable the bell + banner shown for messages from other users.
    #[arg(long, env = "CHAT_NO_NOTIFY")]
    pub no_notify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub keepalive: Duration,
    pub notifications: bool,
}

impl Cli {
    /// Validate parsed flags into a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero keep-alive or a non-http(s) origin.
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        if self.keepalive_secs == 0 {
            return Err(ConfigError::ZeroKeepalive);
        }

        Ok(ClientConfig {
            endpoint: endpoint_url(&self.origin)?,
            keepalive: Duration::from_secs(self.keepalive_secs),
            notifications: !self.no_notify,
        })
    }
}

/// Derive the websocket endpoint from a page origin by upgrading its scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOrigin`] unless the origin is `http://` or `https://`.
pub fn endpoint_url(origin: &str) -> Result<String, ConfigError> {
    let origin = origin.trim().trim_end_matches('/');
    if let Some(rest) = origin.strip_prefix("http://") {
        if !rest.is_empty() {
            return Ok(format!("ws://{rest}"));
        }
    }
    if let Some(rest) = origin.strip_prefix("https://") {
        if !rest.is_empty() {
            return Ok(format!("wss://{rest}"));
        }
    }

    Err(ConfigError::InvalidOrigin(origin.to_owned()))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
