//! HTTP peer client.
//!
//! `GET <peer>/clipboard` fetches, `POST <peer>/clipboard` replaces. Each
//! request carries the configured timeout so a hung peer cannot stall the
//! sync loop indefinitely.

use crate::config::Config;
use crate::error::{Result, SyncError, TransportError};
use crate::transport::PeerClient;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;

/// Endpoint path served by every node
pub const CLIPBOARD_PATH: &str = "/clipboard";

/// A peer reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPeer {
    address: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpPeer {
    /// `base` is the peer's base URL, e.g. `http://10.0.0.2:8080`.
    pub fn new(base: impl Into<String>, client: reqwest::Client) -> Self {
        let address = base.into();
        let endpoint = format!("{}{}", address.trim_end_matches('/'), CLIPBOARD_PATH);
        Self {
            address,
            endpoint,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, source: reqwest::Error) -> TransportError {
        TransportError::Request {
            peer: self.address.clone(),
            source,
        }
    }

    fn check_status(
        &self,
        response: &reqwest::Response,
    ) -> std::result::Result<(), TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                peer: self.address.clone(),
                status,
            })
        }
    }
}

#[async_trait]
impl PeerClient for HttpPeer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn fetch(&self) -> std::result::Result<String, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.check_status(&response)?;

        response.text().await.map_err(|e| self.request_error(e))
    }

    async fn push(&self, text: &str) -> std::result::Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text.to_owned())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.check_status(&response)
    }
}

/// HTTP client shared by all peers of one node.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// One `HttpPeer` per configured address, in config order.
pub fn build_peers(config: &Config) -> Result<Vec<Arc<dyn PeerClient>>> {
    let client = build_client(config.request_timeout)?;
    Ok(config
        .peers
        .iter()
        .map(|peer| {
            Arc::new(HttpPeer::new(peer.as_str(), client.clone())) as Arc<dyn PeerClient>
        })
        .collect())
}
