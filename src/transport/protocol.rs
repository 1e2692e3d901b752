//! Wire types for the JSON-RPC 2.0 endpoints of the service.
//!
//! Two endpoints are used:
//! - `/web/session/authenticate` for the one-time handshake
//! - `/jsonrpc` for every `execute_kw` call

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{TransportError, TransportResult};

/// JSON-RPC protocol version sent on every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Path of the handshake endpoint, relative to the base URL.
pub const AUTHENTICATE_PATH: &str = "web/session/authenticate";

/// Path of the object-service endpoint, relative to the base URL.
pub const JSONRPC_PATH: &str = "jsonrpc";

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the service.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope<P> {
    /// Always "2.0".
    pub jsonrpc: &'static str,
    /// Always "call" for this service.
    pub method: &'static str,
    /// Unique request ID for correlation.
    pub id: String,
    /// Method-specific parameters.
    pub params: P,
}

impl<P: Serialize> RequestEnvelope<P> {
    /// Wrap `params` in a fresh envelope with a random id.
    pub fn call(params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: "call",
            id: uuid::Uuid::new_v4().to_string(),
            params,
        }
    }
}

/// Response envelope received from the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    #[serde(default)]
    pub id: Option<Value>,
    /// Result data (present on success). A literal `null` result is
    /// `Some(Value::Null)`; only a missing member is `None`.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    /// Error information (present on failure).
    #[serde(default)]
    pub error: Option<RemoteFault>,
}

impl ResponseEnvelope {
    /// The call's outcome: the fault if one was reported, otherwise the result.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Remote`] for a fault and
    /// [`TransportError::UnexpectedResponse`] when the envelope carries
    /// neither member.
    pub fn into_result(self) -> TransportResult<Value> {
        match (self.error, self.result) {
            (Some(fault), _) => Err(TransportError::Remote(fault)),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(TransportError::UnexpectedResponse(
                "response carried neither a result nor an error".to_string(),
            )),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// A fault reported by the service's RPC layer.
///
/// Kept verbatim so callers can inspect the server-side exception name and
/// traceback carried in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFault {
    /// Numeric fault code (200 for application errors).
    #[serde(default)]
    pub code: i64,
    /// Short human-readable message.
    #[serde(default)]
    pub message: String,
    /// Structured payload: exception name, debug traceback, arguments.
    #[serde(default)]
    pub data: Value,
}

impl RemoteFault {
    /// Create a fault with an empty data payload.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// The server-side exception name, when the payload carries one.
    pub fn exception_name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }
}

impl fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.data.get("message").and_then(Value::as_str);
        match detail {
            Some(detail) if detail != self.message => {
                write!(f, "{} (code: {}): {}", self.message, self.code, detail)
            }
            _ => write!(f, "{} (code: {})", self.message, self.code),
        }
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// Parameters for `/web/session/authenticate`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateParams<'a> {
    pub db: &'a str,
    pub login: &'a str,
    pub password: &'a str,
}

/// The part of the handshake result this client reads.
///
/// `uid` is `false` when the credentials were rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateResult {
    #[serde(default)]
    pub uid: Value,
}

impl AuthenticateResult {
    /// The authenticated user id, if the handshake succeeded.
    pub fn uid(&self) -> Option<i64> {
        self.uid.as_i64()
    }
}

// ============================================================================
// Object service
// ============================================================================

/// Parameters for an `object.execute_kw` call.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteParams {
    /// Always "object".
    pub service: &'static str,
    /// Always "execute_kw".
    pub method: &'static str,
    /// `[db, uid, password, model, method, args, kwargs]`
    pub args: (String, i64, String, String, String, Vec<Value>, Map<String, Value>),
}

impl ExecuteParams {
    #[allow(clippy::too_many_arguments)]
    pub fn execute_kw(
        database: &str,
        uid: i64,
        password: &str,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Self {
        Self {
            service: "object",
            method: "execute_kw",
            args: (
                database.to_string(),
                uid,
                password.to_string(),
                model.to_string(),
                method.to_string(),
                args,
                kwargs,
            ),
        }
    }
}

/// ORM method names used by this crate.
pub mod methods {
    pub const READ: &str = "read";
    pub const SEARCH: &str = "search";
    pub const SEARCH_READ: &str = "search_read";
    pub const CREATE: &str = "create";
    pub const WRITE: &str = "write";
    pub const UNLINK: &str = "unlink";
    pub const MESSAGE_POST: &str = "message_post";
}

/// Metadata models consulted during relation discovery.
pub mod models {
    /// One row per model: `id`, `model`.
    pub const IR_MODEL: &str = "ir.model";
    /// One row per field: `model_id`, `name`, `ttype`, `relation`.
    pub const IR_MODEL_FIELDS: &str = "ir.model.fields";
}
