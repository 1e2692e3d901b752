//! Crate-level error type.

use thiserror::Error;

use crate::config::SettingsError;
use crate::domain::Domain;
use crate::transport::{RemoteFault, TransportError};

/// Result type for client and resolution operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the verb layer and the relation resolution engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A lookup returned zero rows.
    #[error("{domain} not found on model: {model}")]
    NotFound {
        /// Model that was queried.
        model: String,
        /// Filter that matched nothing.
        domain: Domain,
    },

    /// Input the engine cannot interpret.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// More than one metadata row described the same model or field.
    #[error("ambiguous metadata: {matches} rows describe field '{field}' of model '{model}'")]
    AmbiguousMetadata {
        model: String,
        field: String,
        matches: usize,
    },

    /// The field exists but declares no target model.
    #[error("field '{field}' of model '{model}' is not relational")]
    NotRelational { model: String, field: String },

    /// Failure in the transport layer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configuration could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] SettingsError),
}

/// Discriminant of an [`Error`], independent of which layer raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    MalformedInput,
    RemoteError,
    AmbiguousMetadata,
    NotRelational,
    Transport,
    Config,
}

impl Error {
    pub(crate) fn not_found(model: impl Into<String>, domain: Domain) -> Self {
        Self::NotFound {
            model: model.into(),
            domain,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::MalformedInput(_) => ErrorKind::MalformedInput,
            Error::AmbiguousMetadata { .. } => ErrorKind::AmbiguousMetadata,
            Error::NotRelational { .. } => ErrorKind::NotRelational,
            Error::Transport(TransportError::MalformedUrl(_)) => ErrorKind::MalformedInput,
            Error::Transport(TransportError::Remote(_)) => ErrorKind::RemoteError,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// The service's fault payload, verbatim, if this error carries one.
    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self {
            Error::Transport(err) => err.remote_fault(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
