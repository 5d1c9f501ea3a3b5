//! Bounded in-memory chat history.
//!
//! Oldest entry first. Capacity is fixed; once full, every append evicts the
//! oldest entry before the new one lands (strict FIFO, order is purely temporal).

use frames::LogEntry;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub const CAPACITY: usize = 10;

    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(Self::CAPACITY) }
    }

    /// Replace the whole history with a server snapshot, keeping the newest entries.
    pub fn replace(&mut self, mut entries: Vec<LogEntry>) {
        if entries.len() > Self::CAPACITY {
            entries.drain(..entries.len() - Self::CAPACITY);
        }
        self.entries = entries;
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= Self::CAPACITY {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
