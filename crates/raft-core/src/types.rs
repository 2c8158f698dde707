//! # types
//!
//! why: keep terms, log positions and node identities from being mixed up
//! relations: used by every other module here and by the wire codec in raft-http
//! what: Term, LogIndex, NodeId

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NodeIdError;

/// Position in the replicated log. Entries are numbered from 1; 0 means
/// "before the first entry".
pub type LogIndex = u64;

/// Width of a node identifier in bytes.
pub const NODE_ID_LEN: usize = 16;

/// Logical election epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(pub u64);

impl Term {
    pub const ZERO: Term = Term(0);

    /// The term a candidate moves to when it starts an election, or `None`
    /// once the term space is used up.
    pub fn next(self) -> Option<Term> {
        self.0.checked_add(1).map(Term)
    }
}

impl From<u64> for Term {
    fn from(value: u64) -> Self {
        Term(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, fixed-width identifier for a candidate or leader.
///
/// Both RPCs carry the same 16 byte token.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub [u8; NODE_ID_LEN]);

impl NodeId {
    pub fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Identifier whose first byte is `tag` and whose remaining bytes are zero.
    /// Handy for tests and small local clusters.
    pub fn from_tag(tag: u8) -> Self {
        let mut bytes = [0u8; NODE_ID_LEN];
        bytes[0] = tag;
        Self(bytes)
    }

    /// Build an identifier from a variable-length byte string, which must be
    /// exactly [`NODE_ID_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, NodeIdError> {
        let array: [u8; NODE_ID_LEN] = bytes.try_into().map_err(|_| NodeIdError::Length {
            expected: NODE_ID_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_order_numerically() {
        assert!(Term(1) < Term(2));
        assert_eq!(Term(4).next(), Some(Term(5)));
        assert_eq!(Term(u64::MAX).next(), None);
    }

    #[test]
    fn node_id_round_trips_through_hex() {
        let id = NodeId::from_tag(0xab);
        let parsed: NodeId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_string(), "ab000000000000000000000000000000");
    }

    #[test]
    fn node_id_rejects_wrong_width() {
        let err = NodeId::from_slice(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, NodeIdError::Length { expected: 16, actual: 3 }));
        assert!("zz".parse::<NodeId>().is_err());
    }
}
