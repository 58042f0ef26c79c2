//! HTTP-shaped request and response exchanged with backends

use crate::error::TransportError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chainreq_types::{EffectiveBody, HttpMethod, KeyValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Request body as sent by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Text body; the content type travels in the headers
    Text(String),
    /// Multipart text fields
    Multipart(Vec<KeyValue>),
}

/// Request handed to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: HttpMethod,
    /// Absolute URL, trimmed
    pub url: String,
    /// Headers, one value per name
    pub headers: IndexMap<String, String>,
    /// Query params, one value per name
    pub params: IndexMap<String, String>,
    /// Body
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// Plain GET without headers, params or body
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: IndexMap::new(),
            params: IndexMap::new(),
            body: None,
        }
    }

    /// Body converted from a resolved request body
    #[must_use]
    pub fn body_from(body: &EffectiveBody) -> Option<HttpBody> {
        match body {
            EffectiveBody::None => None,
            EffectiveBody::Text { body, .. } => Some(HttpBody::Text(body.clone())),
            EffectiveBody::FormData { entries } => Some(HttpBody::Multipart(entries.clone())),
        }
    }

    /// Body text as forwarded to a proxy or agent
    ///
    /// Multipart fields are forwarded URL-encoded.
    #[must_use]
    pub fn body_text(&self) -> Option<String> {
        match &self.body {
            None => None,
            Some(HttpBody::Text(text)) => Some(text.clone()),
            Some(HttpBody::Multipart(entries)) => serde_urlencoded::to_string(
                entries
                    .iter()
                    .map(|kv| (kv.key.as_str(), kv.value.as_str()))
                    .collect::<Vec<_>>(),
            )
            .ok(),
        }
    }
}

/// Response returned by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers with lowercased names, in arrival order
    pub headers: IndexMap<String, String>,
    /// Raw body bytes
    pub data: Vec<u8>,
}

impl HttpResponse {
    /// Response with a status and body
    #[must_use]
    pub fn new(status: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            data: data.into(),
        }
    }

    /// Same response with an added header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    /// Parsed `content-length` header
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|v| v.trim().parse().ok())
    }
}

/// Request envelope understood by the forwarding proxy and the local agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedRequest {
    /// Target URL
    pub url: String,
    /// Method
    pub method: String,
    /// Headers
    pub headers: IndexMap<String, String>,
    /// Query params
    pub params: IndexMap<String, String>,
    /// Body text
    pub data: Option<String>,
    /// Ask for a base64 body in the reply
    pub wants_binary: bool,
}

impl From<&HttpRequest> for ForwardedRequest {
    fn from(req: &HttpRequest) -> Self {
        Self {
            url: req.url.clone(),
            method: req.method.as_str().to_string(),
            headers: req.headers.clone(),
            params: req.params.clone(),
            data: req.body_text(),
            wants_binary: true,
        }
    }
}

/// Reply envelope of the forwarding proxy and the local agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedResponse {
    /// Whether the forwarded call produced a response
    pub success: bool,
    /// Target status
    #[serde(default)]
    pub status: u16,
    /// Target headers
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Body, base64 when `is_binary`
    #[serde(default)]
    pub data: String,
    /// Body encoding
    #[serde(default)]
    pub is_binary: bool,
    /// Failure description when `success` is false
    #[serde(default)]
    pub message: Option<String>,
}

impl ForwardedResponse {
    /// Decode into a backend response
    ///
    /// `on_failure` builds the error for an unsuccessful reply.
    ///
    /// # Errors
    /// - the error from `on_failure` when `success` is false
    /// - `TransportError::MalformedResponse` for bad base64
    pub fn into_response(
        self,
        on_failure: impl FnOnce(String) -> TransportError,
    ) -> Result<HttpResponse, TransportError> {
        if !self.success {
            return Err(on_failure(
                self.message.unwrap_or_else(|| "forwarded request failed".to_string()),
            ));
        }
        let data = if self.is_binary {
            BASE64_STANDARD
                .decode(self.data.as_bytes())
                .map_err(|e| TransportError::MalformedResponse(e.to_string()))?
        } else {
            self.data.into_bytes()
        };
        Ok(HttpResponse {
            status: self.status,
            headers: self
                .headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            data,
        })
    }
}
