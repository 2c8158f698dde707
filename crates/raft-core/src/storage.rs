//! # storage
//!
//! why: the seam through which term, vote and log reach stable storage
//! relations: driven by node.rs after every state change, FileStorage lives in raft-storage
//! what: Storage trait, InMemoryStorage

use std::io;

use crate::log::LogEntry;
use crate::types::{LogIndex, NodeId, Term};

/// trait for durable storage of raft state
///
/// this abstraction allows the same node to work with:
/// - real filesystem (raft-storage)
/// - in-memory (testing, throwaway nodes)
pub trait Storage: Send {
    /// persist the current term and voted_for
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> io::Result<()>;

    /// load the persisted term and voted_for
    fn load_term_and_vote(&self) -> io::Result<(Term, Option<NodeId>)>;

    /// append entries to the end of the log
    fn append_entries(&mut self, entries: &[LogEntry]) -> io::Result<()>;

    /// load all log entries (for crash recovery)
    fn load_log(&self) -> io::Result<Vec<LogEntry>>;

    /// drop the entry at `from_index` and everything after it (1-based)
    fn truncate_log_from(&mut self, from_index: LogIndex) -> io::Result<()>;

    /// clear all persisted state
    fn clear(&mut self) -> io::Result<()>;
}

/// in-memory storage
///
/// stores all state in memory, no persistence across restarts
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    term: Term,
    voted_for: Option<NodeId>,
    log: Vec<LogEntry>,
}

impl InMemoryStorage {
    /// create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// create storage already holding the given state
    pub fn with_state(term: Term, voted_for: Option<NodeId>, log: Vec<LogEntry>) -> Self {
        Self { term, voted_for, log }
    }
}

impl Storage for InMemoryStorage {
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> io::Result<()> {
        self.term = term;
        self.voted_for = voted_for;
        Ok(())
    }

    fn load_term_and_vote(&self) -> io::Result<(Term, Option<NodeId>)> {
        Ok((self.term, self.voted_for))
    }

    fn append_entries(&mut self, entries: &[LogEntry]) -> io::Result<()> {
        self.log.extend(entries.iter().cloned());
        Ok(())
    }

    fn load_log(&self) -> io::Result<Vec<LogEntry>> {
        Ok(self.log.clone())
    }

    fn truncate_log_from(&mut self, from_index: LogIndex) -> io::Result<()> {
        self.log.truncate(from_index.saturating_sub(1) as usize);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.term = Term::ZERO;
        self.voted_for = None;
        self.log.clear();
        Ok(())
    }
}
