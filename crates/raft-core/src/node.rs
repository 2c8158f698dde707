//! # node
//!
//! why: own a replica's raft state and answer rpcs against it from many threads at once
//! relations: uses vote.rs and append.rs for decisions, storage.rs for persistence
//! what: RaftNode, NodeStatus, role transitions used by an election driver

use std::io;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::append::{self, LogChange};
use crate::config::RaftConfig;
use crate::error::RaftError;
use crate::log::{Log, LogEntry};
use crate::message::{
    AppendEntriesArgs, AppendEntriesResult, RaftMessage, RequestVoteArgs, RequestVoteResult,
};
use crate::state::{LeaderState, NodeState, PersistentState, RoleState, VolatileState};
use crate::storage::{InMemoryStorage, Storage};
use crate::types::{LogIndex, NodeId, Term};
use crate::vote::{self, VoteVerdict};

/// Point-in-time view of a node, for logs and status pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub id: NodeId,
    pub state: NodeState,
    pub term: Term,
    pub log_length: LogIndex,
    pub commit_index: LogIndex,
    pub last_applied: LogIndex,
}

/// A single Raft replica.
///
/// Each state group has its own reader-writer lock. Locks are always taken
/// in the order persistent, volatile, role, storage. Every path that changes
/// the log or records a vote holds the persistent write lock for its whole
/// duration.
pub struct RaftNode {
    id: NodeId,
    config: RaftConfig,
    persistent: RwLock<PersistentState>,
    volatile: RwLock<VolatileState>,
    role: RwLock<RoleState>,
    storage: Mutex<Box<dyn Storage>>,
}

impl RaftNode {
    /// Create a fresh follower backed by in-memory storage.
    pub fn new(id: NodeId, config: RaftConfig) -> Self {
        Self::from_parts(
            id,
            config,
            PersistentState::new(),
            VolatileState::default(),
            Box::new(InMemoryStorage::new()),
        )
    }

    /// Create a follower that already holds `persistent` and `volatile`,
    /// backed by in-memory storage seeded with the same persistent state.
    pub fn with_state(
        id: NodeId,
        config: RaftConfig,
        persistent: PersistentState,
        volatile: VolatileState,
    ) -> Result<Self, RaftError> {
        volatile.check(persistent.log.last_index())?;
        let storage = InMemoryStorage::with_state(
            persistent.current_term,
            persistent.voted_for,
            persistent.log.entries().to_vec(),
        );
        Ok(Self::from_parts(id, config, persistent, volatile, Box::new(storage)))
    }

    /// Rebuild a node from stable storage. Volatile state starts from zero.
    pub fn restore(id: NodeId, config: RaftConfig, storage: Box<dyn Storage>) -> Result<Self, RaftError> {
        let persistent = reload(&*storage)?;
        info!(%id, term = %persistent.current_term, log_length = persistent.log.len(), "restored node state");
        Ok(Self::from_parts(id, config, persistent, VolatileState::default(), storage))
    }

    fn from_parts(
        id: NodeId,
        config: RaftConfig,
        persistent: PersistentState,
        volatile: VolatileState,
        storage: Box<dyn Storage>,
    ) -> Self {
        Self {
            id,
            config,
            persistent: RwLock::new(persistent),
            volatile: RwLock::new(volatile),
            role: RwLock::new(RoleState::default()),
            storage: Mutex::new(storage),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn config(&self) -> &RaftConfig {
        &self.config
    }

    /// Answer a RequestVote. A granted vote is persisted before returning.
    ///
    /// The reply carries the term this node held when the request arrived.
    #[instrument(level = "debug", skip_all, fields(node = %self.id, candidate = %args.candidate_id, term = %args.term))]
    pub fn handle_request_vote(&self, args: &RequestVoteArgs) -> Result<RequestVoteResult, RaftError> {
        let mut persistent = self.persistent.write();
        let volatile = self.volatile.read();

        let observed_term = persistent.current_term;
        let previous_vote = persistent.voted_for;

        if persistent.advance_term(args.term) {
            self.role.write().step_down();
        }

        let verdict = vote::decide_vote(&persistent, &volatile, args, &self.config);
        if verdict.is_granted() {
            persistent.voted_for = Some(args.candidate_id);
        }

        if persistent.current_term != observed_term || persistent.voted_for != previous_vote {
            let saved = self
                .storage
                .lock()
                .save_term_and_vote(persistent.current_term, persistent.voted_for);
            if let Err(err) = saved {
                error!(%err, "failed to persist vote");
                persistent.current_term = observed_term;
                persistent.voted_for = previous_vote;
                return Err(err.into());
            }
        }

        match verdict {
            VoteVerdict::Granted => debug!("vote granted"),
            VoteVerdict::Rejected(reason) => debug!(?reason, "vote rejected"),
        }

        Ok(RequestVoteResult {
            term: observed_term,
            vote_granted: verdict.is_granted(),
        })
    }

    /// Report whether a vote would be granted, without recording it or
    /// adopting the candidate's term. Only takes shared locks.
    pub fn handle_pre_vote(&self, args: &RequestVoteArgs) -> RequestVoteResult {
        let persistent = self.persistent.read();
        let volatile = self.volatile.read();

        let verdict = vote::decide_vote(&persistent, &volatile, args, &self.config);
        debug!(node = %self.id, candidate = %args.candidate_id, ?verdict, "pre-vote evaluated");

        RequestVoteResult {
            term: persistent.current_term,
            vote_granted: verdict.is_granted(),
        }
    }

    /// Answer an AppendEntries: consistency check, conflict truncation,
    /// splice and commit advance, all under exclusive locks.
    ///
    /// The reply carries the term this node held when the request arrived.
    #[instrument(level = "debug", skip_all, fields(node = %self.id, leader = %args.leader_id, term = %args.term))]
    pub fn handle_append_entries(&self, args: &AppendEntriesArgs) -> Result<AppendEntriesResult, RaftError> {
        let mut persistent = self.persistent.write();
        let mut volatile = self.volatile.write();

        let observed_term = persistent.current_term;
        if args.term < observed_term {
            debug!(current = %observed_term, "rejecting stale leader");
            return Ok(AppendEntriesResult {
                term: observed_term,
                success: false,
            });
        }

        // decide on copies so a failed write leaves the node as it was
        let mut next = persistent.clone();
        let mut next_volatile = *volatile;
        let adopted = next.advance_term(args.term);

        let outcome = append::decide_append(&mut next, &mut next_volatile, args);
        if let Some(reason) = outcome.rejection {
            debug!(?reason, "append rejected");
        }

        let mut storage = self.storage.lock();
        if let Err(err) = persist_append(&mut **storage, &next, adopted, outcome.change) {
            error!(%err, "failed to persist log change");
            // earlier writes of this request may have landed
            match reload(&**storage) {
                Ok(stored) => *persistent = stored,
                Err(reload_err) => error!(%reload_err, "failed to reload state after write failure"),
            }
            return Err(err.into());
        }
        drop(storage);

        *persistent = next;
        *volatile = next_volatile;
        {
            let mut role = self.role.write();
            if adopted || role.state == NodeState::Candidate {
                role.step_down();
            }
            role.current_leader = Some(args.leader_id);
        }

        Ok(AppendEntriesResult {
            term: observed_term,
            success: outcome.success(),
        })
    }

    /// Answer any request variant of [`RaftMessage`]. Responses are not
    /// handled here; they belong to whoever sent the request.
    pub fn handle_message(&self, message: RaftMessage) -> Result<Option<RaftMessage>, RaftError> {
        let reply = match message {
            RaftMessage::PreVoteRequest(args) => Some(RaftMessage::PreVoteResponse(self.handle_pre_vote(&args))),
            RaftMessage::VoteRequest(args) => Some(RaftMessage::VoteResponse(self.handle_request_vote(&args)?)),
            RaftMessage::AppendEntries(args) => {
                Some(RaftMessage::AppendEntriesResponse(self.handle_append_entries(&args)?))
            }
            RaftMessage::PreVoteResponse(_) | RaftMessage::VoteResponse(_) | RaftMessage::AppendEntriesResponse(_) => None,
        };
        Ok(reply)
    }

    /// Start an election: move to the next term, vote for ourselves and
    /// persist that vote. Returns the request to send to every peer.
    pub fn become_candidate(&self) -> Result<RequestVoteArgs, RaftError> {
        let mut persistent = self.persistent.write();
        let previous_term = persistent.current_term;
        let previous_vote = persistent.voted_for;

        let term = previous_term.next().ok_or(RaftError::TermExhausted(previous_term))?;
        persistent.advance_term(term);
        persistent.voted_for = Some(self.id);

        {
            let mut role = self.role.write();
            role.step_down();
            role.state = NodeState::Candidate;
            role.current_leader = None;
        }

        let saved = self.storage.lock().save_term_and_vote(term, Some(self.id));
        if let Err(err) = saved {
            error!(%err, "failed to persist self vote");
            persistent.current_term = previous_term;
            persistent.voted_for = previous_vote;
            self.role.write().step_down();
            return Err(err.into());
        }

        info!(node = %self.id, %term, "became candidate");
        Ok(RequestVoteArgs {
            term,
            candidate_id: self.id,
            last_log_index: persistent.log.last_index(),
            last_log_term: persistent.log.last_term(),
        })
    }

    /// Take leadership after winning an election, creating replication
    /// cursors for `peers` followers. Only a candidate can do this.
    pub fn become_leader(&self, peers: usize) -> bool {
        let persistent = self.persistent.read();
        let mut role = self.role.write();
        if role.state != NodeState::Candidate {
            return false;
        }

        role.state = NodeState::Leader;
        role.current_leader = Some(self.id);
        role.leader = Some(LeaderState::new(peers, persistent.log.last_index()));
        info!(node = %self.id, term = %persistent.current_term, "became leader");
        true
    }

    /// Return to follower, discarding any leader state.
    pub fn step_down(&self) {
        self.role.write().step_down();
    }

    pub fn status(&self) -> NodeStatus {
        let persistent = self.persistent.read();
        let volatile = self.volatile.read();
        let role = self.role.read();

        NodeStatus {
            id: self.id,
            state: role.state,
            term: persistent.current_term,
            log_length: persistent.log.last_index(),
            commit_index: volatile.commit_index,
            last_applied: volatile.last_applied,
        }
    }

    pub fn current_term(&self) -> Term {
        self.persistent.read().current_term
    }

    pub fn voted_for(&self) -> Option<NodeId> {
        self.persistent.read().voted_for
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.persistent.read().log.entries().to_vec()
    }

    pub fn commit_index(&self) -> LogIndex {
        self.volatile.read().commit_index
    }

    pub fn state(&self) -> NodeState {
        self.role.read().state
    }

    pub fn current_leader(&self) -> Option<NodeId> {
        self.role.read().current_leader
    }

    pub fn leader_state(&self) -> Option<LeaderState> {
        self.role.read().leader.clone()
    }

    pub fn check_invariants(&self) -> Result<(), RaftError> {
        let persistent = self.persistent.read();
        let volatile = self.volatile.read();
        volatile.check(persistent.log.last_index())
    }
}

fn reload(storage: &dyn Storage) -> io::Result<PersistentState> {
    let (current_term, voted_for) = storage.load_term_and_vote()?;
    Ok(PersistentState {
        current_term,
        voted_for,
        log: Log::from_entries(storage.load_log()?),
    })
}

fn persist_append(
    storage: &mut dyn Storage,
    persistent: &PersistentState,
    term_changed: bool,
    change: LogChange,
) -> io::Result<()> {
    if term_changed {
        storage.save_term_and_vote(persistent.current_term, persistent.voted_for)?;
    }
    if let Some(index) = change.truncated_from {
        storage.truncate_log_from(index)?;
    }
    if let Some(index) = change.appended_from {
        storage.append_entries(persistent.log.entries_from(index))?;
    }
    Ok(())
}
