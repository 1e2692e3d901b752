//! Relation resolution engine.
//!
//! Relational fields travel over the wire as bare ids: a `[id, label]` pair
//! for single references and an id list for multi references. This module
//! moves between that form and something a caller can use directly.
//!
//! - **Expand** (read direction): replace foreign ids on fetched records with
//!   the related records themselves, one batched `read` per field.
//! - **Collapse** (write direction): replace natural-key values (a code, a
//!   name, an email) on outgoing values with the ids they identify, one
//!   `search_read` per relation spec.
//!
//! Both directions discover each field's target model and cardinality through
//! the [`MetadataProvider`](crate::metadata::MetadataProvider) and process
//! fields concurrently with an all-or-nothing join: the first failure drops
//! the sibling lookups and no partial result is returned.
//!
//! ```text
//!  {id: 7, company_id: [3, "Acme"]}
//!        │  expand(["company_id"])
//!        ▼
//!  {id: 7, company_id: {id: 3, name: "Acme", ...}}
//!
//!  {name: "Ada", company: "Acme"}
//!        │  collapse([RelationSpec::new("company_id", "name").with_alias("company")])
//!        ▼
//!  {name: "Ada", company_id: 3}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod collapse;
mod expand;
mod policy;

pub use policy::{AmbiguityPolicy, MissingMatch, ResolutionPolicy};

use crate::error::Result;
use crate::metadata::{MetadataProvider, RelationDescriptor, RpcMetadataProvider};
use crate::transport::Transport;

/// Declares a natural-key value to collapse into foreign id(s).
///
/// The value under `alias` (or `name` when there is no alias) is matched
/// against `foreign_field` on the target model; the resulting id(s) are
/// written under `name` and the alias key is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub foreign_field: String,
}

impl RelationSpec {
    pub fn new(name: impl Into<String>, foreign_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            foreign_field: foreign_field.into(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The key the natural-key value is read from.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Expands and collapses relational fields against one service.
pub struct RelationResolver<T> {
    transport: Arc<T>,
    metadata: RpcMetadataProvider<T>,
    policy: ResolutionPolicy,
}

impl<T: Transport> RelationResolver<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_policy(transport, ResolutionPolicy::default())
    }

    pub fn with_policy(transport: Arc<T>, policy: ResolutionPolicy) -> Self {
        let metadata = RpcMetadataProvider::new(transport.clone())
            .with_ambiguity_policy(policy.on_ambiguous_metadata);
        Self {
            transport,
            metadata,
            policy,
        }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Determine the target model and cardinality of `model.field`.
    pub async fn resolve_relation(&self, model: &str, field: &str) -> Result<RelationDescriptor> {
        self.metadata.resolve_relation(model, field).await
    }
}
