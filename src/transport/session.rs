//! One-time session handshake shared by every call on a transport.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, OnceCell};

use super::error::TransportResult;

/// The result of a successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    /// Id of the authenticated user, sent with every `execute_kw` call.
    pub uid: i64,
}

/// Something that can perform the handshake.
#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn authenticate(&self) -> TransportResult<SessionHandle>;
}

type Attempt = Shared<BoxFuture<'static, TransportResult<SessionHandle>>>;

/// A session that authenticates on first use.
///
/// Concurrent callers that arrive before the handshake finishes wait on the
/// same in-flight attempt and all receive its outcome, success or error. A
/// caller arriving after an attempt failed starts a new one.
pub struct LazySession<A> {
    authenticator: Arc<A>,
    handle: OnceCell<SessionHandle>,
    attempt: Mutex<Option<Attempt>>,
}

impl<A: Authenticate + 'static> LazySession<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            handle: OnceCell::new(),
            attempt: Mutex::new(None),
        }
    }

    /// Return the session, authenticating if no handshake has succeeded yet.
    pub async fn get(&self) -> TransportResult<SessionHandle> {
        if let Some(handle) = self.handle.get() {
            return Ok(*handle);
        }

        let attempt = self.attempt().await;
        let handle = attempt.await?;
        // Every waiter stores the same handle; later sets are no-ops.
        let _ = self.handle.set(handle);
        Ok(handle)
    }

    /// The in-flight or completed attempt, or a new one if the last failed.
    async fn attempt(&self) -> Attempt {
        let mut slot = self.attempt.lock().await;
        let reusable = slot
            .as_ref()
            .filter(|attempt| !matches!(attempt.peek(), Some(Err(_))))
            .cloned();
        if let Some(attempt) = reusable {
            return attempt;
        }
        if slot.is_some() {
            tracing::debug!("previous handshake failed, retrying");
        }

        let authenticator = Arc::clone(&self.authenticator);
        let attempt = async move { authenticator.authenticate().await }
            .boxed()
            .shared();
        *slot = Some(attempt.clone());
        attempt
    }

    /// The session, if the handshake has already completed.
    pub fn current(&self) -> Option<SessionHandle> {
        self.handle.get().copied()
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }
}
