//! Domain error type
//!
//! Every public operation surfaces exactly one [`IdcError`]: a human-readable
//! operation label, a classification ([`ErrorKind`]) and the original error(s)
//! kept as the cause chain.

use super::http::TransportError;
use std::error::Error as StdError;
use std::fmt;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used throughout the library
pub type Result<T, E = IdcError> = std::result::Result<T, E>;

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, timeout, TLS or body decode failure
    Transport,
    /// The remote service answered with a non-2xx status
    Remote,
    /// A read-by-id found nothing
    NotFound,
    /// A create was attempted for an id that already exists
    Conflict,
    /// One or more items of a bulk operation failed
    PartialBatch,
    /// A targeted import id is absent from the import payload
    TargetNotFoundInPayload,
    /// Caller-side misuse detected before or after the network call
    Usage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Remote => "remote",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::PartialBatch => "partial-batch",
            Self::TargetNotFoundInPayload => "target-not-found-in-payload",
            Self::Usage => "usage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct IdcError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    /// Per-item failures of a bulk operation, in processing order
    errors: Vec<IdcError>,
    /// Ids that were processed successfully before the failure was reported
    succeeded: Vec<String>,
}

impl IdcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            errors: Vec::new(),
            succeeded: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn target_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TargetNotFoundInPayload, message)
    }

    /// Wrap a lower-level error with an operation label.
    ///
    /// The wrapper inherits the kind of the cause so that classification made
    /// deep in the stack survives re-labelling.
    pub fn wrap(message: impl Into<String>, cause: IdcError) -> Self {
        Self {
            kind: cause.kind,
            message: message.into(),
            source: Some(Box::new(cause)),
            errors: Vec::new(),
            succeeded: Vec::new(),
        }
    }

    /// Aggregate per-item failures of a bulk operation
    pub fn partial_batch(
        message: impl Into<String>,
        errors: Vec<IdcError>,
        succeeded: Vec<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::PartialBatch,
            message: message.into(),
            source: None,
            errors,
            succeeded,
        }
    }

    /// Attach an arbitrary cause
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[IdcError] {
        &self.errors
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Remote HTTP status anywhere in the cause chain
    pub fn status(&self) -> Option<u16> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(TransportError::Status { status, .. }) = err.downcast_ref::<TransportError>()
            {
                return Some(status.as_u16());
            }
            current = err.source();
        }
        None
    }

    /// Render the message followed by every cause, one per line
    pub fn chain_display(&self) -> String {
        let mut out = self.message.clone();
        let mut current = self.source();
        while let Some(err) = current {
            out.push_str("\n  caused by: ");
            out.push_str(&err.to_string());
            current = err.source();
        }
        for (idx, err) in self.errors.iter().enumerate() {
            out.push_str(&format!("\n  [{}] ", idx + 1));
            out.push_str(&err.chain_display().replace('\n', "\n  "));
        }
        out
    }
}

impl From<TransportError> for IdcError {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::Status { .. } => ErrorKind::Remote,
            TransportError::InvalidUrl(_) | TransportError::MissingCredentials => ErrorKind::Usage,
            _ => ErrorKind::Transport,
        };
        Self {
            kind,
            message: err.to_string(),
            source: Some(Box::new(err)),
            errors: Vec::new(),
            succeeded: Vec::new(),
        }
    }
}
