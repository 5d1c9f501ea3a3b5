//! Collaborators the chat session drives, plus their terminal implementation.
//!
//! The session only talks to the traits; `TerminalUi` renders to any
//! `io::Write` so tests can capture what a user would see.

use std::io::Write;

use frames::LogEntry;

pub trait Renderer {
    /// Redraw the visible log. Entries arrive oldest first.
    fn render_log(&mut self, entries: &[LogEntry]);
}

pub trait Notifier {
    fn error(&mut self, message: &str);
    fn success(&mut self, message: &str);
    /// Best-effort desktop-style notification. Must never fail.
    fn notify(&mut self, body: &str);
}

pub trait InputSurface {
    fn enable_input(&mut self);
    fn clear_input(&mut self);
    fn disable_input(&mut self, placeholder: &str);
}

// =============================================================================
// COMPOSER
// =============================================================================

/// Line-oriented message composer.
///
/// A line ending in `\` continues the message on the next line (the terminal
/// stand-in for Shift+Enter); any other line submits what has accumulated.
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(partial) = line.strip_suffix('\\') {
            self.draft.push_str(partial);
            self.draft.push('\n');
            return None;
        }
        self.draft.push_str(line);
        Some(std::mem::take(&mut self.draft))
    }

    pub fn clear(&mut self) {
        self.draft.clear();
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }
}

// =============================================================================
// TERMINAL UI
// =============================================================================

pub struct TerminalUi<W: Write> {
    out: W,
    composer: Composer,
    input_enabled: bool,
    notifications: bool,
}

impl<W: Write> TerminalUi<W> {
    pub fn new(out: W, notifications: bool) -> Self {
        Self { out, composer: Composer::default(), input_enabled: false, notifications }
    }

    /// Feed one typed line. Returns the message to send once one is complete.
    /// Lines typed while input is disabled are dropped.
    pub fn compose(&mut self, line: &str) -> Option<String> {
        if !self.input_enabled {
            return None;
        }
        self.composer.push_line(line)
    }

    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Terminal output is best-effort; a broken stdout must not take the session down.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn prompt(&mut self) {
        let _ = write!(self.out, "> ");
        let _ = self.out.flush();
    }
}

impl<W: Write> Renderer for TerminalUi<W> {
    fn render_log(&mut self, entries: &[LogEntry]) {
        self.line("---- chat ----");
        for entry in entries {
            let body = entry.message.replace('\n', "\n    ");
            self.line(&format!("[{}] {body}", entry.timestamp));
        }
        if self.input_enabled {
            self.prompt();
        }
    }
}

impl<W: Write> Notifier for TerminalUi<W> {
    fn error(&mut self, message: &str) {
        self.line(&format!("!! {message}"));
    }

    fn success(&mut self, message: &str) {
        self.line(&format!("** {message}"));
    }

    fn notify(&mut self, body: &str) {
        if !self.notifications {
            return;
        }
        self.line(&format!("\x07(new message) {body}"));
    }
}

impl<W: Write> InputSurface for TerminalUi<W> {
    fn enable_input(&mut self) {
        self.input_enabled = true;
        self.prompt();
    }

    fn clear_input(&mut self) {
        self.composer.clear();
        if self.input_enabled {
            self.prompt();
        }
    }

    fn disable_input(&mut self, placeholder: &str) {
        self.input_enabled = false;
        self.composer.clear();
        self.line(&format!("[input disabled] {placeholder}"));
    }
}

#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;
