//! Transport module.
//!
//! This module executes single remote procedure calls against the service.
//! Everything above it (metadata discovery, relation resolution, the verb
//! layer) is written against the [`Transport`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       HttpTransport                             │
//! │  - LazySession: one handshake, shared by concurrent callers     │
//! │  - JSON-RPC 2.0 envelopes over HTTP POST                        │
//! │  - object.execute_kw(db, uid, password, model, method, ...)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                 POST /jsonrpc  │  POST /web/session/authenticate
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Object-relational RPC service                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use odoo_rpc::transport::{HttpTransport, Transport};
//!
//! let transport = HttpTransport::connect(&config, &settings).await?;
//! let ids = transport
//!     .call("res.partner", "search", vec![serde_json::json!([])], Default::default())
//!     .await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

mod client;
mod error;
pub mod mock;
pub mod protocol;
mod session;

pub use client::HttpTransport;
pub use error::{TransportError, TransportResult};
pub use mock::MockTransport;
pub use protocol::RemoteFault;
pub use session::{Authenticate, LazySession, SessionHandle};

/// Executes one remote call: `model.method(*args, **kwargs)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> TransportResult<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> TransportResult<Value> {
        (**self).call(model, method, args, kwargs).await
    }
}
