//! # raft-core
//!
//! why: the follower-side receiver of the raft protocol in pure, portable rust
//! relations: served over http by raft-http, persisted through raft-storage
//! what: state model, vote and append decisions, the locked RaftNode

pub mod append;
pub mod config;
pub mod error;
pub mod log;
pub mod message;
pub mod node;
pub mod state;
pub mod storage;
pub mod types;
pub mod vote;

pub use append::{AppendOutcome, AppendRejection, LogChange};
pub use config::RaftConfig;
pub use error::{NodeIdError, RaftError};
pub use log::{Log, LogEntry};
pub use message::{AppendEntriesArgs, AppendEntriesResult, RaftMessage, RequestVoteArgs, RequestVoteResult};
pub use node::{NodeStatus, RaftNode};
pub use state::{LeaderState, NodeState, PersistentState, RoleState, VolatileState};
pub use storage::{InMemoryStorage, Storage};
pub use types::{LogIndex, NodeId, Term, NODE_ID_LEN};
pub use vote::{VoteRejection, VoteVerdict};
