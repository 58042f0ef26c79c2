//! Error types for request execution

use chainreq_ledger::LedgerError;
use chainreq_types::{FailureKind, TypesError};

/// HTTP backend failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the response could not be read
    #[error("http error: {0}")]
    Http(String),

    /// Deadline elapsed
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Aborted through `cancel`
    #[error("request cancelled")]
    Cancelled,

    /// Forwarding proxy reported a failure
    #[error("proxy error: {0}")]
    Proxy(String),

    /// Intercepting extension is missing or reported a failure
    #[error("extension error: {0}")]
    Extension(String),

    /// Backend reply could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Check if the request was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if the error is a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Failure of one execution
///
/// Never returned to callers of the executor; converted into a
/// `network_fail` response instead.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Body does not carry a usable call envelope
    #[error("envelope error: {0}")]
    Envelope(#[from] TypesError),

    /// HTTP backend failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Signing or submission failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ExecutionError {
    /// Check if the execution was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Cancelled))
    }

    /// Failure class carried into the response
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Envelope(_) => FailureKind::Validation,
            Self::Transport(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Transport(_) => FailureKind::Transport,
            Self::Ledger(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Ledger(e) if e.is_validation() => FailureKind::Validation,
            Self::Ledger(_) => FailureKind::Ledger,
        }
    }
}
