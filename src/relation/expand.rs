//! Read direction: foreign ids → related records.

use std::collections::{HashMap, HashSet};

use futures::future::try_join_all;
use serde_json::{json, Map, Value};

use super::{MissingMatch, RelationResolver};
use crate::domain::{Domain, Operator};
use crate::error::{Error, Result};
use crate::metadata::{MetadataProvider, RelationDescriptor};
use crate::record::{Batch, Record};
use crate::transport::protocol::methods;
use crate::transport::{Transport, TransportError};

/// A relational value as found on a record.
#[derive(Debug, Clone, PartialEq)]
enum RawRef {
    /// `false` / `null` / absent: nothing referenced, left as is.
    Empty,
    /// Already expanded into full records, left as is.
    Resolved,
    One(i64),
    Many(Vec<i64>),
}

impl RawRef {
    fn parse(value: Option<&Value>, descriptor: &RelationDescriptor, field: &str) -> Result<Self> {
        let malformed = |value: &Value| {
            Error::malformed(format!("unexpected value for relational field '{field}': {value}"))
        };

        let value = match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(RawRef::Empty),
            Some(value) => value,
        };

        match descriptor {
            RelationDescriptor::Single(_) => match value {
                Value::Object(_) => Ok(RawRef::Resolved),
                Value::Number(id) => id.as_i64().map(RawRef::One).ok_or_else(|| malformed(value)),
                // `[id, display_name]`
                Value::Array(pair) => pair
                    .first()
                    .and_then(Value::as_i64)
                    .map(RawRef::One)
                    .ok_or_else(|| malformed(value)),
                _ => Err(malformed(value)),
            },
            RelationDescriptor::Multiple(_) => match value {
                Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                    Ok(RawRef::Resolved)
                }
                Value::Array(items) => items
                    .iter()
                    .map(Value::as_i64)
                    .collect::<Option<Vec<_>>>()
                    .map(RawRef::Many)
                    .ok_or_else(|| malformed(value)),
                _ => Err(malformed(value)),
            },
        }
    }

    fn ids(&self) -> &[i64] {
        match self {
            RawRef::One(id) => std::slice::from_ref(id),
            RawRef::Many(ids) => ids,
            RawRef::Empty | RawRef::Resolved => &[],
        }
    }
}

/// New values for one field, aligned with the input records.
/// `None` leaves the record's value untouched.
struct FieldUpdate {
    field: String,
    values: Vec<Option<Value>>,
}

impl<T: Transport> RelationResolver<T> {
    /// Replace the raw foreign ids under each of `fields` with the related
    /// records.
    ///
    /// The result has the same shape as the input: `Batch::One` stays a single
    /// record and `Batch::Many` keeps its length and order.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any field fails; no partial result is returned.
    pub async fn expand(
        &self,
        model: &str,
        mut records: Batch<Record>,
        fields: &[String],
    ) -> Result<Batch<Record>> {
        self.expand_in_place(model, records.as_mut_slice(), fields).await?;
        Ok(records)
    }

    /// [`expand`](Self::expand) for a single record.
    pub async fn expand_one(
        &self,
        model: &str,
        mut record: Record,
        fields: &[String],
    ) -> Result<Record> {
        self.expand_in_place(model, std::slice::from_mut(&mut record), fields)
            .await?;
        Ok(record)
    }

    /// [`expand`](Self::expand) for a sequence of records.
    pub async fn expand_many(
        &self,
        model: &str,
        mut records: Vec<Record>,
        fields: &[String],
    ) -> Result<Vec<Record>> {
        self.expand_in_place(model, &mut records, fields).await?;
        Ok(records)
    }

    async fn expand_in_place(
        &self,
        model: &str,
        records: &mut [Record],
        fields: &[String],
    ) -> Result<()> {
        if fields.is_empty() || records.is_empty() {
            return Ok(());
        }

        let updates = {
            let records = &*records;
            try_join_all(fields.iter().map(|field| self.expand_field(model, records, field))).await?
        };

        // Applied only once every field succeeded.
        for update in updates {
            for (record, value) in records.iter_mut().zip(update.values) {
                if let Some(value) = value {
                    record.insert(update.field.clone(), value);
                }
            }
        }
        Ok(())
    }

    async fn expand_field(
        &self,
        model: &str,
        records: &[Record],
        field: &str,
    ) -> Result<FieldUpdate> {
        let descriptor = self.metadata.resolve_relation(model, field).await?;

        let refs = records
            .iter()
            .map(|record| RawRef::parse(record.get(field), &descriptor, field))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let ids: Vec<i64> = refs
            .iter()
            .flat_map(RawRef::ids)
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        tracing::trace!(model, field, records = records.len(), ids = ids.len(), "expanding field");

        let related = if ids.is_empty() {
            HashMap::new()
        } else {
            self.fetch(descriptor.target(), &ids).await?
        };

        let values = refs
            .into_iter()
            .map(|raw| self.replacement(raw, descriptor.target(), &related))
            .collect::<Result<Vec<_>>>()?;

        Ok(FieldUpdate {
            field: field.to_string(),
            values,
        })
    }

    /// Read `ids` from `target` in one call.
    async fn fetch(&self, target: &str, ids: &[i64]) -> Result<HashMap<i64, Record>> {
        let rows = self
            .transport
            .call(target, methods::READ, vec![json!(ids)], Map::new())
            .await?;
        let rows: Vec<Record> = serde_json::from_value(rows)
            .map_err(|e| Error::Transport(TransportError::from(e)))?;

        Ok(rows.into_iter().map(|row| (row.id, row)).collect())
    }

    fn replacement(
        &self,
        raw: RawRef,
        target: &str,
        related: &HashMap<i64, Record>,
    ) -> Result<Option<Value>> {
        let fail = self.policy.on_missing_match == MissingMatch::Fail;

        match raw {
            RawRef::Empty | RawRef::Resolved => Ok(None),
            RawRef::One(id) => match related.get(&id) {
                Some(record) => Ok(Some(record.clone().into_value())),
                None if fail => Err(Error::not_found(target, Domain::eq("id", id))),
                None => Ok(Some(Value::Null)),
            },
            RawRef::Many(ids) => {
                let (found, missing): (Vec<i64>, Vec<i64>) =
                    ids.into_iter().partition(|id| related.contains_key(id));
                if fail && !missing.is_empty() {
                    return Err(Error::not_found(
                        target,
                        Domain::clause("id", Operator::In, json!(missing)),
                    ));
                }
                Ok(Some(Value::Array(
                    found
                        .iter()
                        .filter_map(|id| related.get(id))
                        .map(|record| record.clone().into_value())
                        .collect(),
                )))
            }
        }
    }
}
