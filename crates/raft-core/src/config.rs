//! # config
//!
//! why: knobs that change how the receiver judges requests
//! relations: held by RaftNode, filled from the command line by raft-http
//! what: RaftConfig

use serde::{Deserialize, Serialize};

/// Receiver configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftConfig {
    /// Also require the candidate's last log entry to be at least as
    /// up-to-date as ours before granting a vote. When off, only the
    /// commit index recency check applies.
    pub strict_log_check: bool,
}
