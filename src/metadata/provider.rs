//! MetadataProvider trait definition.
//!
//! The MetadataProvider trait abstracts over how relation descriptors are
//! discovered. The primary implementation queries the service's own catalog
//! models through a [`Transport`](crate::transport::Transport).

use async_trait::async_trait;
use futures::future::try_join_all;

use super::types::RelationDescriptor;
use crate::error::Result;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T>;

/// Trait for discovering the shape of relational fields.
///
/// # Example
///
/// ```ignore
/// use odoo_rpc::metadata::MetadataProvider;
///
/// async fn example(provider: &impl MetadataProvider) -> MetadataResult<()> {
///     let company = provider.resolve_relation("res.users", "company_id").await?;
///     assert_eq!(company.target(), "res.company");
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Determine the target model and cardinality of `model.field`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the model or the field is unknown
    /// - `NotRelational` if the field has no target model
    /// - `AmbiguousMetadata` if several rows match and the policy rejects that
    async fn resolve_relation(&self, model: &str, field: &str)
        -> MetadataResult<RelationDescriptor>;

    /// Resolve several fields of one model concurrently.
    ///
    /// Fails as soon as any field fails; the others are dropped.
    async fn resolve_relations(
        &self,
        model: &str,
        fields: &[String],
    ) -> MetadataResult<Vec<RelationDescriptor>> {
        try_join_all(fields.iter().map(|field| self.resolve_relation(model, field))).await
    }
}
