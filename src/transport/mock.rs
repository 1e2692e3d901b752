//! In-memory transport for tests and offline development.
//!
//! [`MockTransport`] behaves like a tiny object-relational service: it keeps
//! rows per model, answers the ORM methods this crate uses, evaluates
//! prefix-notation domains and serves `ir.model` / `ir.model.fields` rows
//! registered through the builder. Every call is recorded so tests can assert
//! on how many round trips an operation made.
//!
//! Rows come back in storage (insertion) order, never in the order ids were
//! requested.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::error::{TransportError, TransportResult};
use super::protocol::{methods, models, RemoteFault};
use super::Transport;

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

#[derive(Default)]
struct Store {
    tables: BTreeMap<String, Vec<Map<String, Value>>>,
    next_id: i64,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert(&mut self, model: &str, mut row: Map<String, Value>) -> i64 {
        let id = match row.get("id").and_then(Value::as_i64) {
            Some(id) => {
                self.next_id = self.next_id.max(id);
                id
            }
            None => self.allocate_id(),
        };
        row.insert("id".to_string(), json!(id));
        self.tables.entry(model.to_string()).or_default().push(row);
        id
    }

    fn rows(&self, model: &str) -> &[Map<String, Value>] {
        self.tables.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    fn model_id(&mut self, model: &str) -> i64 {
        let existing = self
            .rows(models::IR_MODEL)
            .iter()
            .find(|row| row.get("model").and_then(Value::as_str) == Some(model))
            .and_then(|row| row.get("id").and_then(Value::as_i64));

        match existing {
            Some(id) => id,
            None => self.insert(models::IR_MODEL, object(json!({ "model": model }))),
        }
    }
}

/// An in-memory [`Transport`].
///
/// # Example
///
/// ```ignore
/// use odoo_rpc::transport::MockTransport;
/// use serde_json::json;
///
/// let mock = MockTransport::new()
///     .with_relation("res.users", "company_id", "many2one", "res.company")
///     .with_record("res.company", json!({"id": 3, "name": "Acme"}))
///     .with_record("res.users", json!({"id": 7, "company_id": [3, "Acme"]}));
/// ```
#[derive(Default)]
pub struct MockTransport {
    store: Mutex<Store>,
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<(String, String), RemoteFault>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to `model`. A missing `id` is allocated.
    pub fn with_record(self, model: &str, row: Value) -> Self {
        lock(&self.store).insert(model, object(row));
        self
    }

    /// Register a relational field in the metadata models.
    pub fn with_relation(self, model: &str, field: &str, ttype: &str, relation: &str) -> Self {
        self.register_field(model, field, ttype, json!(relation));
        self
    }

    /// Register a non-relational field in the metadata models.
    pub fn with_field(self, model: &str, field: &str, ttype: &str) -> Self {
        self.register_field(model, field, ttype, json!(false));
        self
    }

    /// Make every `model.method` call fail with `fault`.
    pub fn with_failure(self, model: &str, method: &str, fault: RemoteFault) -> Self {
        lock(&self.failures).insert((model.to_string(), method.to_string()), fault);
        self
    }

    fn register_field(&self, model: &str, field: &str, ttype: &str, relation: Value) {
        let mut store = lock(&self.store);
        let model_id = store.model_id(model);
        store.insert(
            models::IR_MODEL_FIELDS,
            object(json!({
                "model_id": [model_id, model],
                "model": model,
                "name": field,
                "ttype": ttype,
                "relation": relation,
            })),
        );
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls made to `model.method`.
    pub fn call_count(&self, model: &str, method: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.model == model && c.method == method)
            .count()
    }

    /// Snapshot of the rows currently stored for `model`.
    pub fn records(&self, model: &str) -> Vec<Map<String, Value>> {
        lock(&self.store).rows(model).to_vec()
    }

    fn dispatch(
        &self,
        model: &str,
        method: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Value, RemoteFault> {
        let mut store = lock(&self.store);

        match method {
            methods::SEARCH_READ => {
                let domain = domain_arg(args, kwargs)?;
                let rows = page(search(store.rows(model), domain)?, kwargs);
                Ok(Value::Array(
                    rows.into_iter().map(|row| project(row, kwargs)).collect(),
                ))
            }
            methods::SEARCH => {
                let domain = domain_arg(args, kwargs)?;
                let rows = page(search(store.rows(model), domain)?, kwargs);
                Ok(Value::Array(
                    rows.into_iter().map(|row| row["id"].clone()).collect(),
                ))
            }
            methods::READ => {
                let ids = ids_arg(args.first())?;
                Ok(Value::Array(
                    store
                        .rows(model)
                        .iter()
                        .filter(|row| row_id(row).is_some_and(|id| ids.contains(&id)))
                        .map(|row| project(row, kwargs))
                        .collect(),
                ))
            }
            methods::CREATE => {
                let vals = args
                    .first()
                    .and_then(Value::as_object)
                    .ok_or_else(|| value_error("create expects a values mapping"))?;
                let mut row = vals.clone();
                row.remove("id");
                Ok(json!(store.insert(model, row)))
            }
            methods::WRITE => {
                let ids = ids_arg(args.first())?;
                let vals = args
                    .get(1)
                    .and_then(Value::as_object)
                    .ok_or_else(|| value_error("write expects a values mapping"))?;
                if let Some(rows) = store.tables.get_mut(model) {
                    for row in rows.iter_mut() {
                        if row_id(row).is_some_and(|id| ids.contains(&id)) {
                            for (key, value) in vals {
                                row.insert(key.clone(), value.clone());
                            }
                        }
                    }
                }
                Ok(json!(true))
            }
            methods::UNLINK => {
                let ids = ids_arg(args.first())?;
                if let Some(rows) = store.tables.get_mut(model) {
                    rows.retain(|row| !row_id(row).is_some_and(|id| ids.contains(&id)));
                }
                Ok(json!(true))
            }
            methods::MESSAGE_POST => {
                let ids = ids_arg(args.first())?;
                let res_id = ids
                    .first()
                    .copied()
                    .ok_or_else(|| value_error("message_post expects a record id"))?;
                let mut message = kwargs.clone();
                message.insert("model".to_string(), json!(model));
                message.insert("res_id".to_string(), json!(res_id));
                Ok(json!(store.insert("mail.message", message)))
            }
            other => Err(RemoteFault {
                code: 200,
                message: "Odoo Server Error".to_string(),
                data: json!({
                    "name": "builtins.AttributeError",
                    "message": format!("type object '{model}' has no attribute '{other}'"),
                }),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> TransportResult<Value> {
        lock(&self.calls).push(RecordedCall {
            model: model.to_string(),
            method: method.to_string(),
            args: args.clone(),
            kwargs: kwargs.clone(),
        });

        // Suspend like a real network call would.
        tokio::task::yield_now().await;

        let scripted = lock(&self.failures)
            .get(&(model.to_string(), method.to_string()))
            .cloned();
        if let Some(fault) = scripted {
            return Err(TransportError::Remote(fault));
        }

        self.dispatch(model, method, &args, &kwargs)
            .map_err(TransportError::Remote)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn row_id(row: &Map<String, Value>) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn value_error(message: &str) -> RemoteFault {
    RemoteFault {
        code: 200,
        message: "Odoo Server Error".to_string(),
        data: json!({ "name": "builtins.ValueError", "message": message }),
    }
}

fn domain_arg<'a>(
    args: &'a [Value],
    kwargs: &'a Map<String, Value>,
) -> Result<&'a [Value], RemoteFault> {
    match args.first().or_else(|| kwargs.get("domain")) {
        None => Ok(&[]),
        Some(Value::Array(terms)) => Ok(terms),
        Some(_) => Err(value_error("domain must be a list")),
    }
}

fn ids_arg(arg: Option<&Value>) -> Result<Vec<i64>, RemoteFault> {
    match arg {
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| id.as_i64().ok_or_else(|| value_error("ids must be integers")))
            .collect(),
        Some(Value::Number(id)) => id
            .as_i64()
            .map(|id| vec![id])
            .ok_or_else(|| value_error("ids must be integers")),
        _ => Err(value_error("missing ids")),
    }
}

fn search<'a>(
    rows: &'a [Map<String, Value>],
    domain: &[Value],
) -> Result<Vec<&'a Map<String, Value>>, RemoteFault> {
    let mut matched = Vec::new();
    for row in rows {
        if matches(domain, row)? {
            matched.push(row);
        }
    }
    Ok(matched)
}

fn page<'a>(
    rows: Vec<&'a Map<String, Value>>,
    kwargs: &Map<String, Value>,
) -> Vec<&'a Map<String, Value>> {
    let offset = kwargs.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
    let limit = kwargs
        .get("limit")
        .and_then(Value::as_u64)
        .filter(|limit| *limit > 0)
        .map(|limit| limit as usize)
        .unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

fn project(row: &Map<String, Value>, kwargs: &Map<String, Value>) -> Value {
    let Some(Value::Array(fields)) = kwargs.get("fields") else {
        return Value::Object(row.clone());
    };

    let mut projected = Map::new();
    projected.insert("id".to_string(), row.get("id").cloned().unwrap_or(Value::Null));
    for field in fields.iter().filter_map(Value::as_str) {
        let value = row.get(field).cloned().unwrap_or(Value::Bool(false));
        projected.insert(field.to_string(), value);
    }
    Value::Object(projected)
}

/// Evaluate a prefix-notation domain; top-level terms are implicitly AND-ed.
fn matches(domain: &[Value], row: &Map<String, Value>) -> Result<bool, RemoteFault> {
    let mut pos = 0;
    let mut result = true;
    while pos < domain.len() {
        result &= eval(domain, &mut pos, row)?;
    }
    Ok(result)
}

fn eval(domain: &[Value], pos: &mut usize, row: &Map<String, Value>) -> Result<bool, RemoteFault> {
    let term = domain
        .get(*pos)
        .ok_or_else(|| value_error("domain operator is missing an operand"))?;
    *pos += 1;

    match term {
        Value::String(op) if op == "&" => {
            let left = eval(domain, pos, row)?;
            let right = eval(domain, pos, row)?;
            Ok(left && right)
        }
        Value::String(op) if op == "|" => {
            let left = eval(domain, pos, row)?;
            let right = eval(domain, pos, row)?;
            Ok(left || right)
        }
        Value::String(op) if op == "!" => Ok(!eval(domain, pos, row)?),
        Value::Array(clause) if clause.len() == 3 => {
            let field = clause[0]
                .as_str()
                .ok_or_else(|| value_error("domain field must be a string"))?;
            let op = clause[1]
                .as_str()
                .ok_or_else(|| value_error("domain operator must be a string"))?;
            let stored = row.get(field).unwrap_or(&Value::Bool(false));
            clause_matches(stored, op, &clause[2])
        }
        other => Err(value_error(&format!("invalid domain term: {other}"))),
    }
}

fn clause_matches(stored: &Value, op: &str, value: &Value) -> Result<bool, RemoteFault> {
    let any_of = |values: &Value| match values {
        Value::Array(values) => values.iter().any(|v| value_eq(stored, v)),
        single => value_eq(stored, single),
    };

    match op {
        "=" => Ok(value_eq(stored, value)),
        "!=" => Ok(!value_eq(stored, value)),
        "in" => Ok(any_of(value)),
        "not in" => Ok(!any_of(value)),
        other => Err(value_error(&format!("unsupported operator: {other}"))),
    }
}

/// Equality with the service's relational conventions: a `[id, label]` pair
/// equals its id, and an id list equals any of its members.
fn value_eq(stored: &Value, value: &Value) -> bool {
    if stored == value {
        return true;
    }
    match stored {
        Value::Array(pair) if pair.len() == 2 && pair[1].is_string() => &pair[0] == value,
        Value::Array(ids) => ids.contains(value),
        _ => false,
    }
}
