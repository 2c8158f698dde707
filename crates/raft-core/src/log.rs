//! # log
//!
//! why: manage the ordered log of commands that raft replicates
//! relations: owned by PersistentState in state.rs, spliced by append.rs, mirrored via storage.rs
//! what: LogEntry struct, 1-based Log container, up-to-date comparison

use serde::{Deserialize, Serialize};

use crate::types::{LogIndex, Term};

/// A single entry in the replicated log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The term when this entry was created
    pub term: Term,
    /// The command to be applied to the state machine
    #[serde(default)]
    pub command: Vec<u8>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(term: impl Into<Term>, command: Vec<u8>) -> Self {
        Self {
            term: term.into(),
            command,
        }
    }
}

/// The replicated log, addressed with 1-based indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the last entry, 0 for an empty log.
    pub fn last_index(&self) -> LogIndex {
        self.entries.len() as LogIndex
    }

    /// Term of the last entry, 0 for an empty log.
    pub fn last_term(&self) -> Term {
        self.entries.last().map(|e| e.term).unwrap_or(Term::ZERO)
    }

    pub fn get(&self, index: LogIndex) -> Option<&LogEntry> {
        if index == 0 {
            return None;
        }
        self.entries.get((index - 1) as usize)
    }

    /// Term stored at `index`. Index 0 reports term 0 so that the position
    /// before the log always matches.
    pub fn term_at(&self, index: LogIndex) -> Option<Term> {
        if index == 0 {
            return Some(Term::ZERO);
        }
        self.get(index).map(|e| e.term)
    }

    /// Whether the entry at `index` carries `term`. Always true for index 0.
    pub fn matches(&self, index: LogIndex, term: Term) -> bool {
        index == 0 || self.term_at(index) == Some(term)
    }

    /// Drop every entry at `index` and after, leaving `index - 1` entries.
    /// Returns how many entries were removed.
    pub fn truncate_from(&mut self, index: LogIndex) -> usize {
        let keep = index.saturating_sub(1) as usize;
        let removed = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        removed
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries from `index` (inclusive) to the end.
    pub fn entries_from(&self, index: LogIndex) -> &[LogEntry] {
        let start = (index.saturating_sub(1) as usize).min(self.entries.len());
        &self.entries[start..]
    }

    /// Whether a log ending at (`last_log_index`, `last_log_term`) is at least
    /// as up-to-date as this one: a later last term wins, equal terms compare
    /// by length.
    pub fn is_up_to_date(&self, last_log_index: LogIndex, last_log_term: Term) -> bool {
        let our_term = self.last_term();
        last_log_term > our_term || (last_log_term == our_term && last_log_index >= self.last_index())
    }
}
