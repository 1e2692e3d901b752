//! Metadata provider module.
//!
//! This module discovers what kind of relationship a named field represents
//! by querying the service's own catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MetadataProvider                           │
//! │  resolve_relation(model, field)                                 │
//! │    1. ir.model         [("model", "=", model)]          → id    │
//! │    2. ir.model.fields  [("model_id", "=", id),                  │
//! │                         ("name", "=", field)]  → ttype, target  │
//! │    3. ttype → Single(target) | Multiple(target)                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Transport                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use odoo_rpc::metadata::{MetadataProvider, RpcMetadataProvider};
//!
//! let provider = RpcMetadataProvider::new(transport.clone());
//! let relation = provider.resolve_relation("res.users", "company_id").await?;
//! println!("{relation}"); // single -> res.company
//! ```

mod provider;
mod rpc_provider;
mod types;

pub use provider::{MetadataProvider, MetadataResult};
pub use rpc_provider::RpcMetadataProvider;
pub use types::*;
