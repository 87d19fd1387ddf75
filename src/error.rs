//! Error types for clipsync.
//!
//! Three failure domains: the local clipboard (`StoreError`), peer RPC
//! (`TransportError`) and everything that can stop the process at startup
//! (`SyncError`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure reading or writing the local clipboard.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to run clipboard helper: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clipboard helper `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Clipboard helper `{command}` did not finish within {after:?}")]
    Timeout {
        command: String,
        after: std::time::Duration,
    },

    #[error("Clipboard content is not valid UTF-8")]
    InvalidUtf8,

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to one peer. Never fatal; the sync engine logs and moves on.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {peer} failed: {source}")]
    Request {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Peer {peer} responded with status {status}")]
    Status {
        peer: String,
        status: reqwest::StatusCode,
    },

    #[error("Peer {peer} is unreachable")]
    Unreachable { peer: String },
}

impl TransportError {
    /// Address of the peer the failed call was addressed to.
    pub fn peer(&self) -> &str {
        match self {
            TransportError::Request { peer, .. }
            | TransportError::Status { peer, .. }
            | TransportError::Unreachable { peer } => peer,
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts_into_sync_error() {
        let err: SyncError = StoreError::Unavailable("no display".to_string()).into();
        assert!(matches!(err, SyncError::Store(_)));
        assert_eq!(err.to_string(), "Clipboard unavailable: no display");
    }

    #[test]
    fn test_command_failed_message() {
        let err = StoreError::CommandFailed {
            command: "xclip".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Error: Can't open display".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Clipboard helper `xclip` exited with exit status: 1: Error: Can't open display"
        );
    }

    #[test]
    fn test_transport_status_peer() {
        let err = TransportError::Status {
            peer: "http://10.0.0.2:8080".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(err.peer(), "http://10.0.0.2:8080");
        assert!(err.to_string().contains("500"));
    }
}
