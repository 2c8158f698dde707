//! # message
//!
//! why: define the raft rpc records exchanged between nodes
//! relations: consumed by node.rs, encoded on the wire by raft-http
//! what: RequestVote/AppendEntries args and results, RaftMessage envelope

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::types::{LogIndex, NodeId, Term};

/// Arguments of a RequestVote (or pre-vote) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteArgs {
    /// Candidate's term
    pub term: Term,
    /// Candidate requesting the vote
    pub candidate_id: NodeId,
    /// Index of the candidate's last log entry
    pub last_log_index: LogIndex,
    /// Term of the candidate's last log entry
    pub last_log_term: Term,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteResult {
    /// Receiver's current term, for the candidate to update itself
    pub term: Term,
    pub vote_granted: bool,
}

/// Arguments of an AppendEntries call. An empty `entries` is a heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesArgs {
    pub term: Term,
    pub leader_id: NodeId,
    /// Index of the entry immediately preceding the new ones
    pub prev_log_index: LogIndex,
    /// Term of the entry at `prev_log_index`
    pub prev_log_term: Term,
    #[serde(default)]
    pub entries: Vec<LogEntry>,
    /// Leader's commit index
    pub leader_commit: LogIndex,
}

impl AppendEntriesArgs {
    pub fn heartbeat(
        term: Term,
        leader_id: NodeId,
        prev_log_index: LogIndex,
        prev_log_term: Term,
        leader_commit: LogIndex,
    ) -> Self {
        Self {
            term,
            leader_id,
            prev_log_index,
            prev_log_term,
            entries: Vec::new(),
            leader_commit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesResult {
    /// Receiver's current term, for the leader to update itself
    pub term: Term,
    pub success: bool,
}

/// All raft messages a node can receive, for callers that multiplex them
/// over a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RaftMessage {
    /// Non-binding probe asking whether a vote would be granted
    PreVoteRequest(RequestVoteArgs),
    PreVoteResponse(RequestVoteResult),
    /// Request a vote during leader election
    VoteRequest(RequestVoteArgs),
    VoteResponse(RequestVoteResult),
    /// Replicate log entries (also serves as heartbeat when entries is empty)
    AppendEntries(AppendEntriesArgs),
    AppendEntriesResponse(AppendEntriesResult),
}

impl RaftMessage {
    /// Term carried by the message.
    pub fn term(&self) -> Term {
        match self {
            RaftMessage::PreVoteRequest(args) | RaftMessage::VoteRequest(args) => args.term,
            RaftMessage::PreVoteResponse(res) | RaftMessage::VoteResponse(res) => res.term,
            RaftMessage::AppendEntries(args) => args.term,
            RaftMessage::AppendEntriesResponse(res) => res.term,
        }
    }
}
