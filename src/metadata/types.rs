//! Metadata types: rows of the service's own model/field catalog and the
//! relation descriptors derived from them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How many related records a relational field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    Multiple,
}

/// The discovered shape of a relational field.
///
/// Valid only for the (model, field) pair it was derived from; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cardinality", content = "target", rename_all = "snake_case")]
pub enum RelationDescriptor {
    /// The field references at most one record of the target model.
    Single(String),
    /// The field references a list of records of the target model.
    Multiple(String),
}

impl RelationDescriptor {
    /// Build a descriptor from a declared field type and target model.
    pub fn from_field_type(ttype: &FieldType, target: impl Into<String>) -> Self {
        if ttype.is_multi_valued() {
            RelationDescriptor::Multiple(target.into())
        } else {
            RelationDescriptor::Single(target.into())
        }
    }

    /// The model related records live in.
    pub fn target(&self) -> &str {
        match self {
            RelationDescriptor::Single(target) | RelationDescriptor::Multiple(target) => target,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationDescriptor::Single(_) => Cardinality::Single,
            RelationDescriptor::Multiple(_) => Cardinality::Multiple,
        }
    }

    pub fn is_multiple(&self) -> bool {
        self.cardinality() == Cardinality::Multiple
    }
}

impl fmt::Display for RelationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationDescriptor::Single(target) => write!(f, "single -> {target}"),
            RelationDescriptor::Multiple(target) => write!(f, "multiple -> {target}"),
        }
    }
}

/// Declared type of a field (`ttype` in `ir.model.fields`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Many2one,
    One2many,
    Many2many,
    Reference,
    Many2oneReference,
    /// Any non-relational type (`char`, `integer`, ...).
    Other(String),
}

impl FieldType {
    /// Whether values of this type are lists of ids.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, FieldType::One2many | FieldType::Many2many)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Many2one => "many2one",
            FieldType::One2many => "one2many",
            FieldType::Many2many => "many2many",
            FieldType::Reference => "reference",
            FieldType::Many2oneReference => "many2one_reference",
            FieldType::Other(ttype) => ttype,
        }
    }
}

impl From<&str> for FieldType {
    fn from(ttype: &str) -> Self {
        match ttype {
            "many2one" => FieldType::Many2one,
            "one2many" => FieldType::One2many,
            "many2many" => FieldType::Many2many,
            "reference" => FieldType::Reference,
            "many2one_reference" => FieldType::Many2oneReference,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ttype = String::deserialize(deserializer)?;
        Ok(FieldType::from(ttype.as_str()))
    }
}

/// A row of `ir.model`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelRow {
    pub id: i64,
    pub model: String,
}

/// A row of `ir.model.fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRow {
    pub name: String,
    pub ttype: FieldType,
    /// Target model; the service sends `false` for non-relational fields.
    #[serde(default, deserialize_with = "false_as_none")]
    pub relation: Option<String>,
}

impl FieldRow {
    /// The relation descriptor, if this field is relational.
    pub fn descriptor(&self) -> Option<RelationDescriptor> {
        self.relation
            .as_deref()
            .filter(|target| !target.is_empty())
            .map(|target| RelationDescriptor::from_field_type(&self.ttype, target))
    }
}

/// The service encodes "no value" as `false`.
fn false_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}
