//! # raft-http
//!
//! why: carry raft rpcs between nodes over http
//! relations: wraps raft-core's RaftNode, persists through raft-storage
//! what: wire codec, axum router, server configuration, serve loop

pub mod codec;
pub mod config;
pub mod routes;

use std::sync::Arc;

use raft_core::RaftNode;
use tokio::net::TcpListener;
use tracing::info;

pub use codec::{CodecError, WireFormat, WIRE_VERSION};
pub use config::ServerConfig;
pub use routes::{router, TransportError};

/// Serve `node` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    node: Arc<RaftNode>,
    default_format: WireFormat,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(node = %node.id(), %addr, "serving raft rpcs");
    axum::serve(listener, router(node, default_format))
        .with_graceful_shutdown(shutdown)
        .await
}
