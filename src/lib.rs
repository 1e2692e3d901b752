//! # odoo-rpc
//!
//! An async client for object-relational services that speak JSON-RPC
//! `execute_kw`, with a relation resolution engine on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 OdooClient (verb layer)                 │
//! │   read, list, search_*, create, write, unlink, notes    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                   RelationResolver                      │
//! │     expand (ids → records)   collapse (keys → ids)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetadataProvider (ir.model catalog)            │
//! │          field → Single(target) | Multiple(target)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │   Transport: HttpTransport (JSON-RPC) | MockTransport   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod metadata;
pub mod record;
pub mod relation;
pub mod transport;

pub use client::{ListOptions, OdooClient, ReadOptions};
pub use error::{Error, ErrorKind, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::client::{ListOptions, OdooClient, ReadOptions};
    pub use crate::config::{ConnectionConfig, Settings};
    pub use crate::domain::{Clause, Domain, Operator, Term};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::metadata::{Cardinality, MetadataProvider, RelationDescriptor};
    pub use crate::record::{Batch, Ids, Record, Values};
    pub use crate::relation::{
        AmbiguityPolicy, MissingMatch, RelationResolver, RelationSpec, ResolutionPolicy,
    };
    pub use crate::transport::{HttpTransport, MockTransport, Transport};
}
