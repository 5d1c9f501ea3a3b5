//! Event loop wiring transport, session and terminal together.
//!
//! Everything runs on one task: transport lifecycle events and typed lines
//! are handled strictly in arrival order, so the session needs no locking.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::session::ChatSession;
use crate::transport::{self, ConnectionState, Link, TransportEvent};
use crate::ui::{Notifier, TerminalUi};

pub const INVALID_INPUT: &str = "input line was not valid UTF-8 and was not sent";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Run the chat client against stdin/stdout until the connection closes.
///
/// # Errors
///
/// Returns [`AppError::Input`] if reading stdin fails.
pub async fn run(config: ClientConfig) -> Result<(), AppError> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with(&config, stdin, std::io::stdout()).await?;
    Ok(())
}

/// Run the client over arbitrary input/output. Returns the output sink once
/// the session has closed.
///
/// # Errors
///
/// Returns [`AppError::Input`] if reading `input` fails.
pub async fn run_with<R, W>(config: &ClientConfig, input: R, out: W) -> Result<W, AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (link, mut events) = transport::open(&config.endpoint, config.keepalive);
    let ui = TerminalUi::new(out, config.notifications);
    let mut session = ChatSession::new(ui, link.clone());

    let mut input = input;
    // Survives cancelled reads so a partially read line is never lost.
    let mut line_buf = Vec::new();
    let mut input_open = true;

    loop {
        // Input is only read once the session accepts it.
        let accepting = input_open && session.state() == ConnectionState::Open;

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = event == TransportEvent::Close;
                session.handle_event(event);
                if closed {
                    break;
                }
            }
            read = input.read_until(b'\n', &mut line_buf), if accepting => {
                if read? == 0 {
                    info!("input closed; leaving chat");
                    input_open = false;
                    link.close();
                    continue;
                }

                let raw = line_buf.strip_suffix(b"\n").unwrap_or(&line_buf[..]);
                let line = match std::str::from_utf8(raw) {
                    Ok(line) => line.to_owned(),
                    Err(e) => {
                        warn!(error = %e, len = raw.len(), "chat: input line dropped");
                        line_buf.clear();
                        session.ui_mut().error(INVALID_INPUT);
                        continue;
                    }
                };
                line_buf.clear();

                let Some(text) = session.ui_mut().compose(&line) else { continue };
                if let Err(e) = session.send_message(&text) {
                    warn!(error = %e, "chat: message not sent");
                    session.ui_mut().error(&e.to_string());
                }
            }
        }
    }

    Ok(session.into_ui().into_inner())
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
