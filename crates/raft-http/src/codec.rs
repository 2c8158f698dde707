//! # codec
//!
//! why: put raft rpc records on the wire in a versioned, schema-checked form
//! relations: used by routes.rs for request bodies and replies
//! what: WireFormat, Frame, encode/decode, CodecError

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version stamped on every frame. Bumped whenever an rpc record changes shape.
pub const WIRE_VERSION: u16 = 1;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const BINCODE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed json body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed binary body: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("unsupported wire version {found}, expected {expected}")]
    Version { found: u16, expected: u16 },

    #[error("unsupported content type {0:?}")]
    ContentType(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireFormat {
    #[default]
    Json,
    Bincode,
}

impl WireFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            WireFormat::Json => JSON_CONTENT_TYPE,
            WireFormat::Bincode => BINCODE_CONTENT_TYPE,
        }
    }

    /// Pick the format named by a Content-Type header value, ignoring
    /// parameters such as `charset`.
    pub fn from_content_type(value: &str) -> Result<Self, CodecError> {
        let mime = value.split(';').next().unwrap_or("").trim();
        match mime {
            JSON_CONTENT_TYPE => Ok(WireFormat::Json),
            BINCODE_CONTENT_TYPE => Ok(WireFormat::Bincode),
            _ => Err(CodecError::ContentType(value.to_string())),
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(WireFormat::Json),
            "bincode" => Ok(WireFormat::Bincode),
            other => Err(format!("unknown wire format {other:?}, expected json or bincode")),
        }
    }
}

/// Envelope carried on the wire around every rpc record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame<T> {
    pub version: u16,
    pub body: T,
}

pub fn encode<T: Serialize>(format: WireFormat, body: &T) -> Result<Vec<u8>, CodecError> {
    let frame = Frame {
        version: WIRE_VERSION,
        body,
    };
    let bytes = match format {
        WireFormat::Json => serde_json::to_vec(&frame)?,
        WireFormat::Bincode => bincode::serialize(&frame)?,
    };
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(format: WireFormat, bytes: &[u8]) -> Result<T, CodecError> {
    let frame: Frame<T> = match format {
        WireFormat::Json => serde_json::from_slice(bytes)?,
        WireFormat::Bincode => bincode::deserialize(bytes)?,
    };
    if frame.version != WIRE_VERSION {
        return Err(CodecError::Version {
            found: frame.version,
            expected: WIRE_VERSION,
        });
    }
    Ok(frame.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raft_core::{AppendEntriesArgs, LogEntry, NodeId, RequestVoteResult, Term};

    #[test]
    fn json_frames_carry_version() {
        let bytes = encode(WireFormat::Json, &RequestVoteResult { term: Term(2), vote_granted: true }).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["version"], WIRE_VERSION);
        assert_eq!(value["body"]["term"], 2);
        assert_eq!(value["body"]["vote_granted"], true);
    }

    #[test]
    fn bincode_preserves_entries() {
        let args = AppendEntriesArgs {
            term: Term(3),
            leader_id: NodeId::from_tag(7),
            prev_log_index: 4,
            prev_log_term: Term(2),
            entries: vec![LogEntry::new(3, vec![0, 255, 1])],
            leader_commit: 4,
        };
        let bytes = encode(WireFormat::Bincode, &args).unwrap();
        let decoded: AppendEntriesArgs = decode(WireFormat::Bincode, &bytes).unwrap();
        assert_eq!(decoded, args);
    }

    #[test]
    fn other_versions_are_rejected() {
        let bytes = serde_json::to_vec(&Frame {
            version: 99,
            body: RequestVoteResult { term: Term(1), vote_granted: false },
        })
        .unwrap();

        let err = decode::<RequestVoteResult>(WireFormat::Json, &bytes).unwrap_err();
        assert!(matches!(err, CodecError::Version { found: 99, expected: 1 }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode::<RequestVoteResult>(WireFormat::Json, b"{not json"),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            decode::<RequestVoteResult>(WireFormat::Bincode, &[1]),
            Err(CodecError::Bincode(_))
        ));
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(
            WireFormat::from_content_type("application/json; charset=utf-8").unwrap(),
            WireFormat::Json
        );
        assert!(WireFormat::from_content_type("text/plain").is_err());
        assert_eq!("bincode".parse::<WireFormat>().unwrap(), WireFormat::Bincode);
    }
}
