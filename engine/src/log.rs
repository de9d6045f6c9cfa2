//! Event log - the human-readable trace of connection and data events.

use crate::{Action, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Category of a log entry, used by displays for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Insert,
    Update,
    Delete,
    Error,
}

impl From<Action> for LogKind {
    fn from(action: Action) -> Self {
        match action {
            Action::Insert => LogKind::Insert,
            Action::Update => LogKind::Update,
            Action::Delete => LogKind::Delete,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogKind::Info => "info",
            LogKind::Insert => "insert",
            LogKind::Update => "update",
            LogKind::Delete => "delete",
            LogKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique within the log that produced it
    pub id: String,
    /// Milliseconds since epoch
    pub timestamp: Timestamp,
    pub message: String,
    pub kind: LogKind,
}

/// Append-only sequence of [`LogEntry`].
///
/// Unbounded unless built with [`EventLog::bounded`], in which case the
/// oldest entries are evicted first.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: Option<usize>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that keeps at most `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Append an entry and return it.
    pub fn append(
        &mut self,
        message: impl Into<String>,
        kind: LogKind,
        timestamp: Timestamp,
    ) -> &LogEntry {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }

        self.entries.push_back(LogEntry {
            id: format!("{}-{}", timestamp, seq),
            timestamp,
            message: message.into(),
            kind,
        });

        // Just pushed
        &self.entries[self.entries.len() - 1]
    }

    /// Entries in append order.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Owned copy of the entries, for publishing.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries. Ids stay unique across a clear.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
