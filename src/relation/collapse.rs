//! Write direction: natural-key values → foreign ids.

use std::collections::HashSet;

use futures::future::try_join_all;
use serde_json::{json, Map, Value};

use super::{RelationResolver, RelationSpec};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::metadata::{MetadataProvider, RelationDescriptor};
use crate::record::{Record, Values};
use crate::transport::protocol::methods;
use crate::transport::{Transport, TransportError};

impl<T: Transport> RelationResolver<T> {
    /// Replace natural-key values in `values` with the foreign id(s) they
    /// identify, as declared by `specs`.
    ///
    /// Single relations get one id; multiple relations get the ids of every
    /// target row whose `foreign_field` is among the given values, in the
    /// order the values were given. Alias keys are removed from the output.
    /// `values` itself is not modified.
    ///
    /// # Errors
    ///
    /// - `MalformedInput` if a spec's key is missing, or a single relation
    ///   is given a sequence
    /// - `NotFound` if the search matches nothing, or no row matches a single
    ///   relation's value
    pub async fn collapse(
        &self,
        model: &str,
        values: &Values,
        specs: &[RelationSpec],
    ) -> Result<Values> {
        let resolved =
            try_join_all(specs.iter().map(|spec| self.collapse_spec(model, values, spec))).await?;

        let mut output = values.clone();
        for (spec, ids) in specs.iter().zip(resolved) {
            if let Some(alias) = &spec.alias {
                output.remove(alias);
            }
            output.insert(spec.name.clone(), ids);
        }
        Ok(output)
    }

    async fn collapse_spec(
        &self,
        model: &str,
        values: &Values,
        spec: &RelationSpec,
    ) -> Result<Value> {
        let descriptor = self.metadata.resolve_relation(model, &spec.name).await?;

        let key = spec.key();
        let natural = values.get(key).ok_or_else(|| {
            Error::malformed(format!("no value under '{key}' for relation '{}'", spec.name))
        })?;

        let wanted: Vec<Value> = match (&descriptor, natural) {
            (RelationDescriptor::Single(_), Value::Array(_)) => {
                return Err(Error::malformed(format!(
                    "relation '{}' references a single record but '{key}' holds a sequence",
                    spec.name
                )))
            }
            (RelationDescriptor::Multiple(_), Value::Array(items)) if items.is_empty() => {
                return Ok(json!([]))
            }
            (_, Value::Array(items)) => items.clone(),
            (_, scalar) => vec![scalar.clone()],
        };

        let target = descriptor.target();
        let domain = Domain::any_of(&spec.foreign_field, wanted.iter().cloned());
        tracing::trace!(
            model,
            relation = %spec.name,
            target,
            values = wanted.len(),
            "collapsing relation"
        );

        let rows = self.search_related(target, &domain).await?;
        let natural_key = |row: &Record| match spec.foreign_field.as_str() {
            "id" => Some(json!(row.id)),
            field => row.get(field).cloned(),
        };

        match &descriptor {
            RelationDescriptor::Single(_) => rows
                .iter()
                .find(|row| natural_key(*row).as_ref() == Some(&wanted[0]))
                .map(|row| json!(row.id))
                .ok_or_else(|| Error::not_found(target, domain)),
            RelationDescriptor::Multiple(_) => {
                let mut seen = HashSet::new();
                let ids: Vec<i64> = wanted
                    .iter()
                    .flat_map(|value| {
                        rows.iter()
                            .filter(move |row| natural_key(*row).as_ref() == Some(value))
                            .map(|row| row.id)
                    })
                    .filter(|id| seen.insert(*id))
                    .collect();
                Ok(json!(ids))
            }
        }
    }

    /// `search_read` on the target model; zero rows is `NotFound`.
    async fn search_related(&self, target: &str, domain: &Domain) -> Result<Vec<Record>> {
        let rows = self
            .transport
            .call(target, methods::SEARCH_READ, vec![domain.to_value()], Map::new())
            .await?;
        let rows: Vec<Record> = serde_json::from_value(rows)
            .map_err(|e| Error::Transport(TransportError::from(e)))?;

        if rows.is_empty() {
            return Err(Error::not_found(target, domain.clone()));
        }
        Ok(rows)
    }
}
