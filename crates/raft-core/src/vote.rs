//! # vote
//!
//! why: decide whether a candidate gets this node's vote
//! relations: called by node.rs for RequestVote and pre-vote
//! what: decide_vote, VoteVerdict, VoteRejection

use crate::config::RaftConfig;
use crate::message::RequestVoteArgs;
use crate::state::{PersistentState, VolatileState};
use crate::types::{LogIndex, NodeId, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteVerdict {
    Granted,
    Rejected(VoteRejection),
}

impl VoteVerdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, VoteVerdict::Granted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    /// Candidate's term is behind ours
    StaleTerm { candidate: Term, current: Term },
    /// Already voted for someone else this term
    AlreadyVoted { voted_for: NodeId },
    /// Candidate's log ends before our commit index
    BehindCommit { commit_index: LogIndex, last_log_index: LogIndex },
    /// Candidate's last entry is older than ours
    LogNotUpToDate,
}

/// Evaluate a vote request against the current state. Pure; recording a
/// granted vote is the caller's job.
///
/// A recorded vote only binds the term it was cast in, so a candidate in a
/// later term is not blocked by it.
pub fn decide_vote(
    persistent: &PersistentState,
    volatile: &VolatileState,
    args: &RequestVoteArgs,
    config: &RaftConfig,
) -> VoteVerdict {
    if args.term < persistent.current_term {
        return VoteVerdict::Rejected(VoteRejection::StaleTerm {
            candidate: args.term,
            current: persistent.current_term,
        });
    }

    if args.term == persistent.current_term {
        if let Some(voted_for) = persistent.voted_for {
            if voted_for != args.candidate_id {
                return VoteVerdict::Rejected(VoteRejection::AlreadyVoted { voted_for });
            }
        }
    }

    if volatile.commit_index > args.last_log_index {
        return VoteVerdict::Rejected(VoteRejection::BehindCommit {
            commit_index: volatile.commit_index,
            last_log_index: args.last_log_index,
        });
    }

    if config.strict_log_check
        && !persistent.log.is_up_to_date(args.last_log_index, args.last_log_term)
    {
        return VoteVerdict::Rejected(VoteRejection::LogNotUpToDate);
    }

    VoteVerdict::Granted
}
