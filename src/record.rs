//! Records and batches as exchanged with the service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values sent to `create` / `write`.
pub type Values = Map<String, Value>;

/// One row returned by the service: an integer id plus any other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// A field other than `id`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Parse a record out of a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Convert into a JSON object, `id` included.
    pub fn into_value(self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_string(), Value::from(self.id));
        object.extend(self.fields);
        Value::Object(object)
    }
}

/// Either a single item or an ordered sequence of them.
///
/// Operations that accept a `Batch` return the same variant they were given:
/// a single record never comes back as a one-element sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        match self {
            Batch::One(_) => 1,
            Batch::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Batch::Many(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Batch::One(item) => std::slice::from_ref(item),
            Batch::Many(items) => items,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Batch::One(item) => std::slice::from_mut(item),
            Batch::Many(items) => items,
        }
    }

    /// The single item, if this is `One`.
    pub fn into_one(self) -> Option<T> {
        match self {
            Batch::One(item) => Some(item),
            Batch::Many(_) => None,
        }
    }

    /// The sequence, if this is `Many`.
    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            Batch::One(_) => None,
            Batch::Many(items) => Some(items),
        }
    }
}

impl From<Record> for Batch<Record> {
    fn from(record: Record) -> Self {
        Batch::One(record)
    }
}

impl From<Vec<Record>> for Batch<Record> {
    fn from(records: Vec<Record>) -> Self {
        Batch::Many(records)
    }
}

/// One or more record ids, as accepted by `write` and `unlink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ids(pub Vec<i64>);

impl Ids {
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl From<i64> for Ids {
    fn from(id: i64) -> Self {
        Ids(vec![id])
    }
}

impl From<Vec<i64>> for Ids {
    fn from(ids: Vec<i64>) -> Self {
        Ids(ids)
    }
}

impl From<&[i64]> for Ids {
    fn from(ids: &[i64]) -> Self {
        Ids(ids.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for Ids {
    fn from(ids: [i64; N]) -> Self {
        Ids(ids.to_vec())
    }
}
