//! Domain filters.
//!
//! A domain is the service's query language: a flat list in prefix (Polish)
//! notation mixing `[field, operator, value]` clauses with the boolean
//! operators `&`, `|` and `!`. Top-level expressions are implicitly AND-ed.
//!
//! ```text
//! ["|", ["name", "=", "Acme"], ["name", "=", "Globex"]]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Like,
    ILike,
    ChildOf,
    /// Any other operator, sent verbatim.
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::ChildOf => "child_of",
            Operator::Other(op) => op,
        }
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "child_of" => Operator::ChildOf,
            other => Operator::Other(other.to_string()),
        })
    }
}

/// A single `[field, operator, value]` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// One element of a domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    And,
    Or,
    Not,
    Clause(Clause),
}

/// A filter in prefix notation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain(Vec<Term>);

impl Domain {
    /// The empty domain, which matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// A domain with a single clause.
    pub fn clause(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self(vec![Term::Clause(Clause::new(field, op, value))])
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Operator::Eq, value)
    }

    /// `field = v1 OR field = v2 OR ...`
    ///
    /// `n` values produce `n - 1` leading `|` followed by `n` equality
    /// clauses; one value produces a bare clause and no values produce the
    /// empty (match-all) domain.
    pub fn any_of<I>(field: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let clauses: Vec<Term> = values
            .into_iter()
            .map(|v| Term::Clause(Clause::new(field, Operator::Eq, v)))
            .collect();

        let mut terms = vec![Term::Or; clauses.len().saturating_sub(1)];
        terms.extend(clauses);
        Self(terms)
    }

    /// Append a clause, AND-ed with what is already there.
    pub fn with(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.0.push(Term::Clause(Clause::new(field, op, value)));
        self
    }

    /// `self OR other`. An empty side matches everything, so the result does too.
    pub fn or(self, other: Domain) -> Domain {
        if self.is_empty() || other.is_empty() {
            return Domain::new();
        }
        let mut terms = vec![Term::Or];
        terms.extend(self.into_expression().0);
        terms.extend(other.into_expression().0);
        Domain(terms)
    }

    /// `NOT self`.
    pub fn negate(self) -> Domain {
        let mut terms = vec![Term::Not];
        terms.extend(self.into_expression().0);
        Domain(terms)
    }

    /// Make the implicit top-level AND explicit so the domain is one expression.
    fn into_expression(self) -> Domain {
        let count = self.expression_count();
        let mut terms = vec![Term::And; count.saturating_sub(1)];
        terms.extend(self.0);
        Domain(terms)
    }

    fn expression_count(&self) -> usize {
        let mut pos = 0;
        let mut count = 0;
        while pos < self.0.len() {
            pos = self.skip_expression(pos);
            count += 1;
        }
        count
    }

    fn skip_expression(&self, pos: usize) -> usize {
        match self.0.get(pos) {
            None => self.0.len(),
            Some(Term::And | Term::Or) => {
                let left = self.skip_expression(pos + 1);
                self.skip_expression(left)
            }
            Some(Term::Not) => self.skip_expression(pos + 1),
            Some(Term::Clause(_)) => pos + 1,
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The JSON array sent over the wire.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::And => serializer.serialize_str("&"),
            Term::Or => serializer.serialize_str("|"),
            Term::Not => serializer.serialize_str("!"),
            Term::Clause(clause) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&clause.field)?;
                seq.serialize_element(clause.op.as_str())?;
                seq.serialize_element(&clause.value)?;
                seq.end()
            }
        }
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl TryFrom<Value> for Domain {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Array(items) = value else {
            return Err(format!("domain must be a list, got {value}"));
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::String(op) => match op.as_str() {
                    "&" => Ok(Term::And),
                    "|" => Ok(Term::Or),
                    "!" => Ok(Term::Not),
                    other => Err(format!("unknown domain operator: {other}")),
                },
                Value::Array(mut parts) if parts.len() == 3 => {
                    let value = parts.pop().unwrap_or(Value::Null);
                    match (&parts[0], &parts[1]) {
                        (Value::String(field), Value::String(op)) => Ok(Term::Clause(Clause {
                            field: field.clone(),
                            op: op.parse().unwrap_or(Operator::Other(op.clone())),
                            value,
                        })),
                        _ => Err(
                            "domain clause must start with a field and an operator".to_string()
                        ),
                    }
                }
                other => Err(format!("invalid domain term: {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Domain)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Domain::try_from(value).map_err(de::Error::custom)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
