//! # append
//!
//! why: decide how a follower answers AppendEntries and reconcile its log with the leader's
//! relations: called by node.rs under exclusive locks, log changes mirrored to storage by the caller
//! what: decide_append, AppendOutcome, AppendRejection, LogChange

use tracing::warn;

use crate::message::AppendEntriesArgs;
use crate::state::{PersistentState, VolatileState};
use crate::types::{LogIndex, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendRejection {
    /// Leader's term is behind ours
    StaleTerm { leader: Term, current: Term },
    /// Our log ends before `prev_log_index`
    MissingEntries { last_log_index: LogIndex, prev_log_index: LogIndex },
    /// Entry at `index` has a different term than the leader expects
    TermMismatch { index: LogIndex, expected: Term, found: Term },
    /// Leader disagrees with an entry we already know is committed
    CommittedConflict { index: LogIndex, commit_index: LogIndex },
}

/// How the log was changed while handling a request, so the caller can
/// replay the same change onto stable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogChange {
    /// Entries from this index onward were removed
    pub truncated_from: Option<LogIndex>,
    /// Entries from this index onward were newly written
    pub appended_from: Option<LogIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub rejection: Option<AppendRejection>,
    pub change: LogChange,
}

impl AppendOutcome {
    pub fn success(&self) -> bool {
        self.rejection.is_none()
    }

    fn rejected(rejection: AppendRejection, change: LogChange) -> Self {
        Self {
            rejection: Some(rejection),
            change,
        }
    }
}

/// Run the AppendEntries receiver rules against `persistent` and `volatile`.
///
/// On a consistency failure the conflicting suffix is dropped. On success the
/// leader's entries are spliced in after `prev_log_index` and the commit
/// index follows `leader_commit`. Nothing at or before the commit index is
/// ever removed.
pub fn decide_append(
    persistent: &mut PersistentState,
    volatile: &mut VolatileState,
    args: &AppendEntriesArgs,
) -> AppendOutcome {
    let mut change = LogChange::default();

    if args.term < persistent.current_term {
        return AppendOutcome::rejected(
            AppendRejection::StaleTerm {
                leader: args.term,
                current: persistent.current_term,
            },
            change,
        );
    }

    let log = &mut persistent.log;

    if log.last_index() < args.prev_log_index {
        return AppendOutcome::rejected(
            AppendRejection::MissingEntries {
                last_log_index: log.last_index(),
                prev_log_index: args.prev_log_index,
            },
            change,
        );
    }

    if let Some(found) = log.term_at(args.prev_log_index) {
        if found != args.prev_log_term {
            let index = args.prev_log_index;
            if index <= volatile.commit_index {
                warn!(index, commit_index = volatile.commit_index, "refusing to truncate committed entry");
            } else {
                log.truncate_from(index);
                change.truncated_from = Some(index);
            }
            return AppendOutcome::rejected(
                AppendRejection::TermMismatch {
                    index,
                    expected: args.prev_log_term,
                    found,
                },
                change,
            );
        }
    }

    for (offset, entry) in args.entries.iter().enumerate() {
        let index = args.prev_log_index + 1 + offset as LogIndex;
        match log.term_at(index) {
            Some(term) if term == entry.term => continue,
            Some(_) => {
                if index <= volatile.commit_index {
                    warn!(index, commit_index = volatile.commit_index, "leader conflicts with committed entry");
                    return AppendOutcome::rejected(
                        AppendRejection::CommittedConflict {
                            index,
                            commit_index: volatile.commit_index,
                        },
                        change,
                    );
                }
                log.truncate_from(index);
                change.truncated_from = Some(index);
            }
            None => {}
        }
        change.appended_from.get_or_insert(index);
        log.push(entry.clone());
    }

    let last_new_index = args.prev_log_index + args.entries.len() as LogIndex;
    let target = args.leader_commit.min(last_new_index);
    if target > volatile.commit_index {
        volatile.commit_index = target;
    }

    AppendOutcome {
        rejection: None,
        change,
    }
}
