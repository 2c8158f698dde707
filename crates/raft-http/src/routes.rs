//! # routes
//!
//! why: expose a RaftNode's rpcs over http
//! relations: decodes with codec.rs, decides with raft_core::RaftNode
//! what: router, rpc handlers, TransportError status mapping

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use raft_core::{AppendEntriesArgs, RaftError, RaftNode, RequestVoteArgs};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{debug, warn};

use crate::codec::{self, CodecError, WireFormat};

pub const REQUEST_VOTE_PATH: &str = "/request_vote";
pub const APPEND_ENTRIES_PATH: &str = "/append_entries";
pub const PRE_VOTE_PATH: &str = "/pre_vote";

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<RaftNode>,
    /// Format assumed when a request carries no Content-Type
    pub default_format: WireFormat,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bad request: {0}")]
    Decode(CodecError),

    #[error("failed to encode reply: {0}")]
    Encode(CodecError),

    #[error(transparent)]
    Node(#[from] RaftError),

    #[error("rpc task failed: {0}")]
    Task(#[from] JoinError),
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::Decode(_) => StatusCode::BAD_REQUEST,
            TransportError::Encode(_) | TransportError::Node(_) | TransportError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "rpc failed");
        } else {
            debug!(error = %self, "rpc rejected at transport");
        }
        (status, self.to_string()).into_response()
    }
}

/// Create an axum router for handling Raft RPCs. Only POST is routed; any
/// other method gets 405 from axum before a handler runs.
pub fn router(node: Arc<RaftNode>, default_format: WireFormat) -> Router {
    Router::new()
        .route(REQUEST_VOTE_PATH, post(handle_request_vote))
        .route(APPEND_ENTRIES_PATH, post(handle_append_entries))
        .route(PRE_VOTE_PATH, post(handle_pre_vote))
        .with_state(AppState { node, default_format })
}

fn request_format(headers: &HeaderMap, default_format: WireFormat) -> Result<WireFormat, TransportError> {
    match headers.get(CONTENT_TYPE) {
        None => Ok(default_format),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| TransportError::Decode(CodecError::ContentType(format!("{value:?}"))))?;
            WireFormat::from_content_type(value).map_err(TransportError::Decode)
        }
    }
}

fn decode_request<T: DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(WireFormat, T), TransportError> {
    let format = request_format(headers, state.default_format)?;
    let args = codec::decode(format, body).map_err(TransportError::Decode)?;
    Ok((format, args))
}

/// Replies go out in the format the request came in.
fn encode_reply<T: Serialize>(format: WireFormat, reply: &T) -> Result<Response, TransportError> {
    let bytes = codec::encode(format, reply).map_err(TransportError::Encode)?;
    let content_type = HeaderValue::from_static(format.content_type());
    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Run a node call on the blocking pool. Node calls wait on locks and may
/// sync files to disk.
async fn call_node<T, F>(node: &Arc<RaftNode>, call: F) -> Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce(&RaftNode) -> Result<T, RaftError> + Send + 'static,
{
    let node = Arc::clone(node);
    let reply = task::spawn_blocking(move || call(&node)).await??;
    Ok(reply)
}

async fn handle_request_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TransportError> {
    let (format, args) = decode_request::<RequestVoteArgs>(&state, &headers, &body)?;
    let reply = call_node(&state.node, move |node| node.handle_request_vote(&args)).await?;
    encode_reply(format, &reply)
}

async fn handle_append_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TransportError> {
    let (format, args) = decode_request::<AppendEntriesArgs>(&state, &headers, &body)?;
    let reply = call_node(&state.node, move |node| node.handle_append_entries(&args)).await?;
    encode_reply(format, &reply)
}

async fn handle_pre_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TransportError> {
    let (format, args) = decode_request::<RequestVoteArgs>(&state, &headers, &body)?;
    let reply = call_node(&state.node, move |node| Ok(node.handle_pre_vote(&args))).await?;
    encode_reply(format, &reply)
}
