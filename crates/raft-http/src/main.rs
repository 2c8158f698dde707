//! raft-node binary
//!
//! Runs a single replica answering RequestVote and AppendEntries.
//!
//! Usage: raft-node --id <HEX16> [--host H] [--port P] [--data-dir DIR] [--wire-format json|bincode]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use raft_core::{InMemoryStorage, RaftNode, Storage};
use raft_http::ServerConfig;
use raft_storage::FileStorage;
use tokio::net::TcpListener;
use tracing::{info, warn};

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing()?;

    let storage: Box<dyn Storage> = match &config.data_dir {
        Some(dir) => Box::new(
            FileStorage::new(dir).with_context(|| format!("opening data dir {}", dir.display()))?,
        ),
        None => {
            warn!("no --data-dir given, state will not survive a restart");
            Box::new(InMemoryStorage::new())
        }
    };

    let node = RaftNode::restore(config.id, config.raft_config(), storage)
        .context("restoring node state")?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    raft_http::serve(listener, Arc::new(node), config.wire_format, shutdown_signal()).await?;
    Ok(())
}
