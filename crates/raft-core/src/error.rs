//! # error
//!
//! why: name the failures that can escape raft-core
//! relations: returned by node.rs, mapped to http statuses by raft-http
//! what: RaftError, NodeIdError

use std::io;

use thiserror::Error;

use crate::types::Term;

/// Failures of the collaborators around the decision logic.
///
/// Vote and append rejections are not errors; they are reported in the
/// RPC results.
#[derive(Debug, Error)]
pub enum RaftError {
    #[error("storage failure: {0}")]
    Storage(#[from] io::Error),

    #[error("state invariant violated: {0}")]
    Invariant(String),

    #[error("term {0} is the last one, cannot start another election")]
    TermExhausted(Term),
}

#[derive(Debug, Error)]
pub enum NodeIdError {
    #[error("node id must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("node id is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
