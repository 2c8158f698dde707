//! # config
//!
//! why: everything a raft-node process needs to know at startup
//! relations: parsed in main.rs, turned into raft_core::RaftConfig
//! what: ServerConfig (clap)

use std::path::PathBuf;

use clap::Parser;
use raft_core::{NodeId, RaftConfig};

use crate::codec::WireFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "raft-node")]
#[command(about = "Raft replica answering RequestVote and AppendEntries over HTTP", long_about = None)]
pub struct ServerConfig {
    /// This node's identifier as 32 hex characters
    #[arg(long)]
    pub id: NodeId,

    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Directory for term, vote and log. State is kept in memory when absent.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Body format assumed for requests without a Content-Type (json or bincode)
    #[arg(long, default_value = "json")]
    pub wire_format: WireFormat,

    /// Also compare last log terms before granting a vote
    #[arg(long)]
    pub strict_log_check: bool,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn raft_config(&self) -> RaftConfig {
        RaftConfig {
            strict_log_check: self.strict_log_check,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "01000000000000000000000000000000";

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::try_parse_from(["raft-node", "--id", ID]).unwrap();

        assert_eq!(config.id, NodeId::from_tag(1));
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.data_dir, None);
        assert_eq!(config.wire_format, WireFormat::Json);
        assert!(!config.raft_config().strict_log_check);
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "raft-node",
            "--id",
            ID,
            "--port",
            "9001",
            "--data-dir",
            "/tmp/raft1",
            "--wire-format",
            "bincode",
            "--strict-log-check",
        ])
        .unwrap();

        assert_eq!(config.port, 9001);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/raft1")));
        assert_eq!(config.wire_format, WireFormat::Bincode);
        assert!(config.raft_config().strict_log_check);
    }

    #[test]
    fn short_ids_are_rejected() {
        assert!(ServerConfig::try_parse_from(["raft-node", "--id", "0102"]).is_err());
    }
}
