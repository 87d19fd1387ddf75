//! HTTP surface - `/clipboard` for peers and local clients alike.
//!
//! - `GET /clipboard` returns the current value as `text/plain`
//! - `POST /clipboard` replaces it with the raw request body, invalid UTF-8
//!   decoded lossily
//! - anything else, HEAD included, is answered with 405

use crate::error::{Result, StoreError};
use crate::state::ReplicatedValue;
use crate::transport::CLIPBOARD_PATH;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Acknowledgement body for a successful replace
pub const REPLACE_ACK: &str = "Clipboard updated";

/// Errors returned to the HTTP caller.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed to read request body: {0}")]
    BadBody(String),

    #[error("Failed to update local clipboard: {0}")]
    Store(#[from] StoreError),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::BadBody(_) => StatusCode::BAD_REQUEST,
            RequestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Router exposing `/clipboard` over `state`.
///
/// No body size limit is applied.
pub fn router(state: Arc<ReplicatedValue>) -> Router {
    Router::new()
        .route(
            CLIPBOARD_PATH,
            get(fetch_clipboard)
                .post(replace_clipboard)
                .head(reject_head),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn fetch_clipboard(State(state): State<Arc<ReplicatedValue>>) -> String {
    state.read().await
}

// `get` would otherwise answer HEAD through the GET handler.
async fn reject_head() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

async fn replace_clipboard(
    State(state): State<Arc<ReplicatedValue>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<&'static str, RequestError> {
    let body = body.map_err(|e| RequestError::BadBody(e.body_text()))?;
    // Same decoding as `HttpPeer::fetch`, so both directions agree on invalid text.
    let text = String::from_utf8_lossy(&body).into_owned();
    debug!(bytes = text.len(), "Replacing clipboard");

    state.write(text).await.map_err(|e| {
        warn!(error = %e, "Local clipboard write failed, in-memory value updated");
        RequestError::from(e)
    })?;

    Ok(REPLACE_ACK)
}

/// Serve `/clipboard` on `listener` until `shutdown` fires or its sender is dropped.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ReplicatedValue>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Clipboard server listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    info!("Clipboard server stopped");
    Ok(())
}
