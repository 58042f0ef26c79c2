//! Error types for the ledger layer
//!
//! Covers:
//! - RPC errors returned by a node
//! - Transport failures and timeouts
//! - Key store and signing failures
//! - Argument and amount validation

/// Ledger error type
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Live node unreachable during initialization
    #[error("failed to connect to {url}: {reason}")]
    ConnectionFailed {
        /// Node URL
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// Node answered with a JSON-RPC error
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message or cause
        message: String,
    },

    /// Request could not be delivered or the reply could not be read
    #[error("transport error: {0}")]
    Transport(String),

    /// Node did not answer in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// No key for the account in the key store
    #[error("no key for {account_id} on {network_id}")]
    KeyNotFound {
        /// Account
        account_id: String,
        /// Network
        network_id: String,
    },

    /// Key text is not a valid ed25519 key
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Attached amount could not be parsed
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Call arguments are not a JSON object
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Reconnection tried to switch the signed-in account
    #[error("account mismatch: signed in as {expected}, got {actual}")]
    AccountMismatch {
        /// Account of the session
        expected: String,
        /// Account offered on reconnect
        actual: String,
    },

    /// Write attempted without a signed-in account
    #[error("no signed-in account")]
    NotSignedIn,

    /// Access key nonce cannot be advanced
    #[error("nonce exhausted for {0}")]
    NonceOverflow(String),

    /// Transaction or key encoding failed
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Local key-value or key store failed
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Check if the error ends initialization rather than one call
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::AccountMismatch { .. })
    }

    /// Check if the error is a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the error is a local validation failure
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidAmount(_) | Self::InvalidArgs(_))
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
