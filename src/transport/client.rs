//! HTTP transport speaking JSON-RPC to the service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use super::error::{TransportError, TransportResult};
use super::protocol::{
    AuthenticateParams, AuthenticateResult, ExecuteParams, RequestEnvelope, ResponseEnvelope,
    AUTHENTICATE_PATH, JSONRPC_PATH,
};
use super::session::{Authenticate, LazySession, SessionHandle};
use super::Transport;
use crate::config::{ConnectionConfig, TransportSettings};

/// Transport that sends `execute_kw` calls over HTTP.
///
/// The handshake runs once, on the first call (or eagerly in
/// [`HttpTransport::connect`]); every later call reuses its user id.
///
/// # Example
///
/// ```ignore
/// use odoo_rpc::config::{ConnectionConfig, TransportSettings};
/// use odoo_rpc::transport::{HttpTransport, Transport};
///
/// let config = ConnectionConfig::new("https://erp.example.com", "prod", "admin", "secret");
/// let transport = HttpTransport::connect(&config, &TransportSettings::default()).await?;
///
/// let count = transport
///     .call("res.partner", "search_count", vec![serde_json::json!([])], Default::default())
///     .await?;
/// ```
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    database: String,
    password: String,
    timeout: Duration,
    session: LazySession<HttpAuthenticator>,
}

impl HttpTransport {
    /// Build a transport without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(config: &ConnectionConfig, settings: &TransportSettings) -> TransportResult<Self> {
        let base = config.base_url()?;
        let timeout = settings.timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::from)?;

        let endpoint = join(&base, JSONRPC_PATH)?;
        let authenticator = HttpAuthenticator {
            http: http.clone(),
            endpoint: join(&base, AUTHENTICATE_PATH)?,
            database: config.database.clone(),
            login: config.login.clone(),
            password: config.password.clone(),
            timeout,
        };

        Ok(Self {
            http,
            endpoint,
            database: config.database.clone(),
            password: config.password.clone(),
            timeout,
            session: LazySession::new(authenticator),
        })
    }

    /// Build a transport and complete the handshake before returning.
    ///
    /// # Errors
    ///
    /// Propagates construction errors and any handshake failure.
    pub async fn connect(
        config: &ConnectionConfig,
        settings: &TransportSettings,
    ) -> TransportResult<Self> {
        let transport = Self::new(config, settings)?;
        transport.session().await?;
        Ok(transport)
    }

    /// The session handle, authenticating first if needed.
    pub async fn session(&self) -> TransportResult<SessionHandle> {
        self.session.get().await
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> TransportResult<Value> {
        let session = self.session.get().await?;
        tracing::debug!(model, method, uid = session.uid, "execute_kw");

        let envelope = RequestEnvelope::call(ExecuteParams::execute_kw(
            &self.database,
            session.uid,
            &self.password,
            model,
            method,
            args,
            kwargs,
        ));
        post(&self.http, &self.endpoint, &envelope, self.timeout)
            .await?
            .into_result()
    }
}

/// Performs the `/web/session/authenticate` handshake.
struct HttpAuthenticator {
    http: reqwest::Client,
    endpoint: Url,
    database: String,
    login: String,
    password: String,
    timeout: Duration,
}

#[async_trait]
impl Authenticate for HttpAuthenticator {
    async fn authenticate(&self) -> TransportResult<SessionHandle> {
        let envelope = RequestEnvelope::call(AuthenticateParams {
            db: &self.database,
            login: &self.login,
            password: &self.password,
        });
        let result = post(&self.http, &self.endpoint, &envelope, self.timeout)
            .await?
            .into_result()?;
        let result: AuthenticateResult = serde_json::from_value(result)?;

        match result.uid() {
            Some(uid) => {
                tracing::info!(
                    database = %self.database,
                    login = %self.login,
                    uid,
                    "authenticated"
                );
                Ok(SessionHandle { uid })
            }
            None => Err(TransportError::AuthenticationFailed {
                database: self.database.clone(),
                login: self.login.clone(),
            }),
        }
    }
}

async fn post<P: Serialize>(
    http: &reqwest::Client,
    url: &Url,
    envelope: &RequestEnvelope<P>,
    timeout: Duration,
) -> TransportResult<ResponseEnvelope> {
    let body = serde_json::to_vec(envelope).map_err(TransportError::serialize)?;

    let response = http
        .post(url.clone())
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .body(body)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| classify(e, timeout))?;

    let bytes = response.bytes().await.map_err(|e| classify(e, timeout))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout.as_secs())
    } else {
        TransportError::from(err)
    }
}

fn join(base: &Url, path: &str) -> TransportResult<Url> {
    base.join(path)
        .map_err(|e| TransportError::MalformedUrl(format!("{base}{path}: {e}")))
}
