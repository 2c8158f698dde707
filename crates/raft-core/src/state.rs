//! # state
//!
//! why: model the per-node state raft requires, grouped by lifetime
//! relations: guarded by node.rs, read and written by vote.rs and append.rs
//! what: PersistentState, VolatileState, LeaderState, NodeState, RoleState

use serde::{Deserialize, Serialize};

use crate::error::RaftError;
use crate::log::Log;
use crate::types::{LogIndex, NodeId, Term};

/// State every server keeps on stable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentState {
    /// Latest term this server has seen
    pub current_term: Term,
    /// Candidate that received our vote in `current_term`, if any
    pub voted_for: Option<NodeId>,
    pub log: Log,
}

impl PersistentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self) -> bool {
        self.voted_for.is_some()
    }

    pub fn has_voted_for(&self, candidate: &NodeId) -> bool {
        self.voted_for.as_ref() == Some(candidate)
    }

    /// Move to `term` if it is newer, forgetting the vote cast in the old
    /// term. Returns whether the term changed.
    pub fn advance_term(&mut self, term: Term) -> bool {
        if term <= self.current_term {
            return false;
        }
        self.current_term = term;
        self.voted_for = None;
        true
    }
}

/// In-memory state rebuilt at every start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatileState {
    /// Highest log index known to be committed
    pub commit_index: LogIndex,
    /// Highest log index applied to the state machine
    pub last_applied: LogIndex,
}

impl VolatileState {
    /// commit_index <= last log index, last_applied <= commit_index.
    pub fn check(&self, last_log_index: LogIndex) -> Result<(), RaftError> {
        if self.commit_index > last_log_index {
            return Err(RaftError::Invariant(format!(
                "commit index {} beyond last log index {}",
                self.commit_index, last_log_index
            )));
        }
        if self.last_applied > self.commit_index {
            return Err(RaftError::Invariant(format!(
                "last applied {} beyond commit index {}",
                self.last_applied, self.commit_index
            )));
        }
        Ok(())
    }
}

/// Replication cursors, one slot per peer. Only exists while leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderState {
    pub next_index: Vec<LogIndex>,
    pub match_index: Vec<LogIndex>,
}

impl LeaderState {
    pub fn new(peers: usize, last_log_index: LogIndex) -> Self {
        Self {
            next_index: vec![last_log_index + 1; peers],
            match_index: vec![0; peers],
        }
    }
}

/// The three possible states a Raft node can be in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Passive state - listens for heartbeats, votes when asked
    #[default]
    Follower,
    /// Transitional state - requesting votes to become leader
    Candidate,
    /// Active state - manages log replication, sends heartbeats
    Leader,
}

/// Role bookkeeping guarded separately from the raft state groups.
#[derive(Debug, Clone, Default)]
pub struct RoleState {
    pub state: NodeState,
    /// Leader of the current term, as last announced by AppendEntries
    pub current_leader: Option<NodeId>,
    pub leader: Option<LeaderState>,
}

impl RoleState {
    pub fn step_down(&mut self) {
        self.state = NodeState::Follower;
        self.leader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_term_clears_vote() {
        let mut state = PersistentState {
            current_term: Term(2),
            voted_for: Some(NodeId::from_tag(1)),
            log: Log::new(),
        };

        assert!(!state.advance_term(Term(2)));
        assert!(state.has_voted_for(&NodeId::from_tag(1)));

        assert!(state.advance_term(Term(3)));
        assert_eq!(state.current_term, Term(3));
        assert!(!state.has_voted());
    }

    #[test]
    fn term_never_moves_backwards() {
        let mut state = PersistentState::new();
        state.advance_term(Term(5));
        assert!(!state.advance_term(Term(4)));
        assert_eq!(state.current_term, Term(5));
    }

    #[test]
    fn volatile_invariants_are_checked() {
        let ok = VolatileState { commit_index: 2, last_applied: 1 };
        assert!(ok.check(2).is_ok());

        let past_log = VolatileState { commit_index: 3, last_applied: 0 };
        assert!(past_log.check(2).is_err());

        let past_commit = VolatileState { commit_index: 1, last_applied: 2 };
        assert!(past_commit.check(5).is_err());
    }

    #[test]
    fn leader_state_starts_after_last_entry() {
        let leader = LeaderState::new(2, 7);
        assert_eq!(leader.next_index, vec![8, 8]);
        assert_eq!(leader.match_index, vec![0, 0]);
    }
}
