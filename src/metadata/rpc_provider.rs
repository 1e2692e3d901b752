//! RpcMetadataProvider implementation.
//!
//! This module provides the primary MetadataProvider implementation, which
//! reads `ir.model` and `ir.model.fields` through a Transport.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map};

use super::provider::{MetadataProvider, MetadataResult};
use super::types::{FieldRow, ModelRow, RelationDescriptor};
use crate::domain::{Domain, Operator};
use crate::error::Error;
use crate::relation::AmbiguityPolicy;
use crate::transport::protocol::{methods, models};
use crate::transport::{Transport, TransportError};

/// MetadataProvider implementation that queries the service's catalog.
///
/// Every call to [`resolve_relation`](MetadataProvider::resolve_relation)
/// makes two sequential remote reads; nothing is cached.
///
/// # Example
///
/// ```ignore
/// use odoo_rpc::metadata::{MetadataProvider, RpcMetadataProvider};
///
/// let provider = RpcMetadataProvider::new(Arc::new(transport));
/// let tags = provider.resolve_relation("res.partner", "category_id").await?;
/// ```
pub struct RpcMetadataProvider<T> {
    transport: Arc<T>,
    on_ambiguous: AmbiguityPolicy,
}

impl<T: Transport> RpcMetadataProvider<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            on_ambiguous: AmbiguityPolicy::default(),
        }
    }

    pub fn with_ambiguity_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.on_ambiguous = policy;
        self
    }

    async fn search_read<R: DeserializeOwned>(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
    ) -> MetadataResult<Vec<R>> {
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(fields));

        let rows = self
            .transport
            .call(model, methods::SEARCH_READ, vec![domain.to_value()], kwargs)
            .await?;

        serde_json::from_value(rows)
            .map_err(|e| Error::Transport(TransportError::from(e)))
    }

    /// Pick the row to use out of a catalog query result.
    ///
    /// An empty result is reported against the caller's model, with a domain
    /// naming the field, rather than against the catalog model.
    fn pick<R>(
        &self,
        rows: Vec<R>,
        catalog: &str,
        model: &str,
        field: &str,
    ) -> MetadataResult<R> {
        let matches = rows.len();
        if matches > 1 {
            match self.on_ambiguous {
                AmbiguityPolicy::Reject => {
                    return Err(Error::AmbiguousMetadata {
                        model: model.to_string(),
                        field: field.to_string(),
                        matches,
                    })
                }
                AmbiguityPolicy::FirstMatch => {
                    tracing::warn!(
                        catalog,
                        model,
                        field,
                        matches,
                        "ambiguous metadata, using first row"
                    );
                }
            }
        }

        rows.into_iter().next().ok_or_else(|| {
            tracing::debug!(catalog, model, field, "no catalog row");
            Error::not_found(model, Domain::eq("name", field))
        })
    }
}

#[async_trait]
impl<T: Transport> MetadataProvider for RpcMetadataProvider<T> {
    async fn resolve_relation(
        &self,
        model: &str,
        field: &str,
    ) -> MetadataResult<RelationDescriptor> {
        let model_domain = Domain::eq("model", model);
        let rows: Vec<ModelRow> = self
            .search_read(models::IR_MODEL, &model_domain, &["model"])
            .await?;
        let parent = self.pick(rows, models::IR_MODEL, model, field)?;

        let field_domain = Domain::eq("model_id", parent.id).with("name", Operator::Eq, field);
        let rows: Vec<FieldRow> = self
            .search_read(
                models::IR_MODEL_FIELDS,
                &field_domain,
                &["name", "ttype", "relation"],
            )
            .await?;
        let row = self.pick(rows, models::IR_MODEL_FIELDS, model, field)?;

        let descriptor = row.descriptor().ok_or_else(|| Error::NotRelational {
            model: model.to_string(),
            field: field.to_string(),
        })?;

        tracing::debug!(model, field, %descriptor, "resolved relation");
        Ok(descriptor)
    }
}
