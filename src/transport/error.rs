//! Transport-specific error types.

use std::sync::Arc;

use thiserror::Error;

use super::protocol::RemoteFault;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while talking to the remote service.
///
/// Cloneable so that one failed handshake can be handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The configured base URL is not an http(s) URL.
    #[error("malformed service URL: {0}")]
    MalformedUrl(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// Request timed out waiting for a response.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Failed to serialize request to JSON.
    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] Arc<serde_json::Error>),

    /// Failed to deserialize response from JSON.
    #[error("failed to deserialize response: {0}")]
    DeserializeFailed(#[source] Arc<serde_json::Error>),

    /// The service's RPC layer reported a fault.
    #[error("remote error: {0}")]
    Remote(RemoteFault),

    /// The handshake completed but did not yield a user id.
    #[error("authentication failed for login '{login}' on database '{database}'")]
    AuthenticationFailed {
        /// Database the handshake targeted.
        database: String,
        /// Login that was rejected.
        login: String,
    },

    /// The response envelope carried neither a result nor an error.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl TransportError {
    /// Create a remote error from a fault payload.
    pub fn remote(fault: RemoteFault) -> Self {
        Self::Remote(fault)
    }

    /// The remote fault carried by this error, if any.
    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self {
            Self::Remote(fault) => Some(fault),
            _ => None,
        }
    }

    pub(crate) fn serialize(err: serde_json::Error) -> Self {
        Self::SerializeFailed(Arc::new(err))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::DeserializeFailed(Arc::new(err))
    }
}
