//! Error types for the chainreq data model

/// Data model errors
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// Body has no embedded call envelope (non-JSON content type or no body)
    #[error("request body does not carry a call envelope")]
    MissingEnvelope,

    /// Body text is not a valid call envelope
    #[error("invalid call envelope: {0}")]
    InvalidEnvelope(String),

    /// `args_base64` could not be decoded into an argument map
    #[error("invalid envelope arguments: {0}")]
    InvalidArgs(String),

    /// Contract ABI document could not be imported
    #[error("invalid contract ABI: {0}")]
    InvalidAbi(String),

    /// Configuration file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// Path that was read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TypesError {
    /// Check if the error comes from the request envelope rather than config
    #[inline]
    #[must_use]
    pub fn is_envelope_error(&self) -> bool {
        matches!(
            self,
            Self::MissingEnvelope | Self::InvalidEnvelope(_) | Self::InvalidArgs(_)
        )
    }
}
