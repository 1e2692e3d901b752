//! High-level verbs over a [`Transport`].
//!
//! [`OdooClient`] wraps the raw `execute_kw` surface with typed reads, searches
//! and writes, and wires the [`RelationResolver`] in so callers can ask for
//! relational fields to be expanded on the way out and natural keys to be
//! collapsed on the way in.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::config::{ConnectionConfig, Settings, TransportSettings};
use crate::domain::{Domain, Operator};
use crate::error::{Error, Result};
use crate::metadata::RelationDescriptor;
use crate::record::{Ids, Record, Values};
use crate::relation::{RelationResolver, RelationSpec, ResolutionPolicy};
use crate::transport::protocol::methods;
use crate::transport::{HttpTransport, Transport, TransportError};

const NOTE_SUBTYPE: &str = "mail.mt_note";
const COMMENT_SUBTYPE: &str = "mail.mt_comment";

/// Options shared by the reading verbs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Fields to return. `None` lets the service pick its default set.
    pub fields: Option<Vec<String>>,
    /// Relational fields to expand after the read.
    pub resolve: Vec<String>,
    /// Extra keyword arguments merged verbatim (`context`, `order`, ...).
    pub extra: Map<String, Value>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn resolve<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        if let Some(fields) = &self.fields {
            kwargs.insert("fields".to_string(), json!(fields));
        }
        for (key, value) in &self.extra {
            kwargs.insert(key.clone(), value.clone());
        }
        kwargs
    }
}

/// Options for [`OdooClient::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub offset: u64,
    pub limit: u64,
    pub read: ReadOptions,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
            read: ReadOptions::default(),
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn read(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        kwargs.insert("offset".to_string(), json!(self.offset));
        kwargs.insert("limit".to_string(), json!(self.limit));
        // Explicit extras win over the paging defaults.
        kwargs.extend(self.read.kwargs());
        kwargs
    }
}

/// A client bound to one service.
///
/// # Example
///
/// ```ignore
/// use odoo_rpc::prelude::*;
///
/// let client = OdooClient::from_settings(&Settings::load()?, None).await?;
/// let user = client
///     .read("res.users", 7, &ReadOptions::new().resolve(["company_id"]))
///     .await?;
/// ```
pub struct OdooClient<T = HttpTransport> {
    transport: Arc<T>,
    resolver: RelationResolver<T>,
}

impl OdooClient<HttpTransport> {
    /// Connect with the named connection from `settings` (or its default one),
    /// applying the configured transport and resolution settings.
    ///
    /// # Errors
    ///
    /// Fails if the connection cannot be resolved, the base URL is invalid or
    /// the handshake is rejected.
    pub async fn from_settings(settings: &Settings, connection: Option<&str>) -> Result<Self> {
        let config = settings.connection_config(connection)?;
        let transport = HttpTransport::connect(&config, &settings.transport).await?;
        Ok(Self::with_policy(Arc::new(transport), settings.resolution))
    }

    /// Connect with default transport and resolution settings.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let transport = HttpTransport::connect(&config, &TransportSettings::default()).await?;
        Ok(Self::new(Arc::new(transport)))
    }
}

impl<T: Transport> OdooClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_policy(transport, ResolutionPolicy::default())
    }

    pub fn with_policy(transport: Arc<T>, policy: ResolutionPolicy) -> Self {
        let resolver = RelationResolver::with_policy(transport.clone(), policy);
        Self {
            transport,
            resolver,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn resolver(&self) -> &RelationResolver<T> {
        &self.resolver
    }

    /// Raw `execute_kw` passthrough.
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        Ok(self.transport.call(model, method, args, kwargs).await?)
    }

    async fn call_as<R: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<R> {
        let value = self.call(model, method, args, kwargs).await?;
        serde_json::from_value(value).map_err(|e| Error::Transport(TransportError::from(e)))
    }

    /// Determine the target model and cardinality of `model.field`.
    pub async fn resolve_relation(&self, model: &str, field: &str) -> Result<RelationDescriptor> {
        self.resolver.resolve_relation(model, field).await
    }

    /// Read one record by id.
    #[tracing::instrument(level = "debug", skip(self, options))]
    pub async fn read(&self, model: &str, id: i64, options: &ReadOptions) -> Result<Record> {
        let rows: Vec<Record> = self
            .call_as(model, methods::READ, vec![json!([id])], options.kwargs())
            .await?;
        let record = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(model, id_domain(&[id])))?;

        self.resolver.expand_one(model, record, &options.resolve).await
    }

    /// Read several records by id.
    #[tracing::instrument(level = "debug", skip(self, options))]
    pub async fn read_many(
        &self,
        model: &str,
        ids: &[i64],
        options: &ReadOptions,
    ) -> Result<Vec<Record>> {
        let rows: Vec<Record> = self
            .call_as(model, methods::READ, vec![json!(ids)], options.kwargs())
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found(model, id_domain(ids)));
        }

        self.resolver.expand_many(model, rows, &options.resolve).await
    }

    /// Page through every record of `model`.
    #[tracing::instrument(
        level = "debug",
        skip(self, options),
        fields(offset = options.offset, limit = options.limit)
    )]
    pub async fn list(&self, model: &str, options: &ListOptions) -> Result<Vec<Record>> {
        let rows: Vec<Record> = self
            .call_as(model, methods::SEARCH_READ, vec![json!([])], options.kwargs())
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found(model, Domain::new()));
        }

        self.resolver.expand_many(model, rows, &options.read.resolve).await
    }

    /// First id matching `domain`.
    pub async fn search_id(
        &self,
        model: &str,
        domain: &Domain,
        extra: &Map<String, Value>,
    ) -> Result<i64> {
        let ids = self.search_ids(model, domain, extra).await?;
        ids.first()
            .copied()
            .ok_or_else(|| Error::not_found(model, domain.clone()))
    }

    /// Every id matching `domain`.
    #[tracing::instrument(level = "debug", skip(self, domain, extra), fields(domain = %domain))]
    pub async fn search_ids(
        &self,
        model: &str,
        domain: &Domain,
        extra: &Map<String, Value>,
    ) -> Result<Vec<i64>> {
        let ids: Vec<i64> = self
            .call_as(model, methods::SEARCH, vec![domain.to_value()], extra.clone())
            .await?;
        if ids.is_empty() {
            return Err(Error::not_found(model, domain.clone()));
        }
        Ok(ids)
    }

    /// Every record matching `domain`.
    #[tracing::instrument(level = "debug", skip(self, domain, options), fields(domain = %domain))]
    pub async fn search_many(
        &self,
        model: &str,
        domain: &Domain,
        options: &ReadOptions,
    ) -> Result<Vec<Record>> {
        let rows = self.search_read(model, domain, options).await?;
        self.resolver.expand_many(model, rows, &options.resolve).await
    }

    /// First record matching `domain`.
    #[tracing::instrument(level = "debug", skip(self, domain, options), fields(domain = %domain))]
    pub async fn search_one(
        &self,
        model: &str,
        domain: &Domain,
        options: &ReadOptions,
    ) -> Result<Record> {
        let rows = self.search_read(model, domain, options).await?;
        let record = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(model, domain.clone()))?;

        self.resolver.expand_one(model, record, &options.resolve).await
    }

    async fn search_read(
        &self,
        model: &str,
        domain: &Domain,
        options: &ReadOptions,
    ) -> Result<Vec<Record>> {
        let rows: Vec<Record> = self
            .call_as(model, methods::SEARCH_READ, vec![domain.to_value()], options.kwargs())
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found(model, domain.clone()));
        }
        Ok(rows)
    }

    /// Create a record and return its id. Natural keys named by `specs` are
    /// collapsed first.
    #[tracing::instrument(level = "debug", skip(self, values, specs))]
    pub async fn create(
        &self,
        model: &str,
        values: &Values,
        specs: &[RelationSpec],
    ) -> Result<i64> {
        let values = self.prepare(model, values, specs).await?;
        self.call_as(model, methods::CREATE, vec![Value::Object(values)], Map::new())
            .await
    }

    /// Update one or more records.
    pub async fn write(
        &self,
        model: &str,
        ids: impl Into<Ids>,
        values: &Values,
        specs: &[RelationSpec],
    ) -> Result<bool> {
        let ids = ids.into();
        tracing::debug!(model, ids = ?ids.as_slice(), "write");

        let values = self.prepare(model, values, specs).await?;
        self.call_as(
            model,
            methods::WRITE,
            vec![json!(ids.as_slice()), Value::Object(values)],
            Map::new(),
        )
        .await
    }

    /// Update every record matching `domain` and return their ids.
    pub async fn search_and_write(
        &self,
        model: &str,
        domain: &Domain,
        values: &Values,
        specs: &[RelationSpec],
        extra: &Map<String, Value>,
    ) -> Result<Vec<i64>> {
        let ids = self.search_ids(model, domain, extra).await?;
        self.write(model, ids.as_slice(), values, specs).await?;
        Ok(ids)
    }

    /// Delete one or more records.
    pub async fn unlink(&self, model: &str, ids: impl Into<Ids>) -> Result<bool> {
        let ids = ids.into();
        tracing::debug!(model, ids = ?ids.as_slice(), "unlink");

        self.call_as(model, methods::UNLINK, vec![json!(ids.as_slice())], Map::new())
            .await
    }

    /// Post an internal note on a record's chatter. Returns the message id.
    pub async fn send_note(&self, model: &str, record_id: i64, body: &str) -> Result<i64> {
        self.post_message(model, record_id, body, NOTE_SUBTYPE).await
    }

    /// Post a message to a record's followers. Returns the message id.
    pub async fn send_message(&self, model: &str, record_id: i64, body: &str) -> Result<i64> {
        self.post_message(model, record_id, body, COMMENT_SUBTYPE).await
    }

    async fn post_message(
        &self,
        model: &str,
        record_id: i64,
        body: &str,
        subtype: &str,
    ) -> Result<i64> {
        let mut kwargs = Map::new();
        kwargs.insert("body".to_string(), json!(body));
        kwargs.insert("message_type".to_string(), json!("comment"));
        kwargs.insert("subtype".to_string(), json!(subtype));

        self.call_as(model, methods::MESSAGE_POST, vec![json!([record_id])], kwargs)
            .await
    }

    async fn prepare(
        &self,
        model: &str,
        values: &Values,
        specs: &[RelationSpec],
    ) -> Result<Values> {
        if specs.is_empty() {
            return Ok(values.clone());
        }
        self.resolver.collapse(model, values, specs).await
    }
}

fn id_domain(ids: &[i64]) -> Domain {
    Domain::clause("id", Operator::In, json!(ids))
}
