//! Error types for `setu-core`.
//!
//! Remote failures keep the HTTP status, reason phrase and raw body so the
//! caller can show the server's own explanation. Secrets never appear in
//! error messages.

use std::fmt;

use setu_storage::StorageError;

/// Detail of a non-2xx response from the signing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status (empty when unknown).
    pub status_text: String,
    /// Raw response body text.
    pub body: String,
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.status, self.status_text, self.body)
    }
}

/// All errors surfaced by the credential store, API client and workflow.
#[derive(Debug, thiserror::Error)]
pub enum EsignError {
    /// A required input was missing before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The credential storage could not be written or cleared.
    #[error("credential storage error: {0}")]
    Storage(#[from] StorageError),

    /// `POST /documents` returned a non-2xx status.
    #[error("Document upload failed: {0}")]
    Upload(HttpFailure),

    /// `POST /signature` returned a non-2xx status.
    #[error("Signature initiation failed: {0}")]
    Signature(HttpFailure),

    /// `GET /signature/{id}/status` returned a non-2xx status.
    #[error("Status fetch failed: {0}")]
    Status(HttpFailure),

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response body was not the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A submission step was requested out of order.
    #[error(transparent)]
    Workflow(#[from] TransitionError),

    /// A local file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EsignError {
    /// The HTTP detail, for the three remote-failure variants.
    #[must_use]
    pub fn http_failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::Upload(f) | Self::Signature(f) | Self::Status(f) => Some(f),
            _ => None,
        }
    }
}

/// A workflow transition was requested from the wrong phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {phase}")]
pub struct TransitionError {
    /// The transition that was attempted.
    pub action: &'static str,
    /// Name of the phase the submission was in.
    pub phase: &'static str,
}
