//! Discriminated outcome of one request execution

use crate::request::RestRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One response header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Header name
    pub key: String,
    /// Header value
    pub value: String,
}

impl ResponseHeader {
    /// New header entry
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Size and timing of a successful execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Body size in bytes; absent for transaction outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u64>,
    /// Elapsed milliseconds between dispatch and completion
    pub response_duration: u64,
}

/// Failure classes carried by `NetworkFail` and `ScriptFail`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, malformed response, proxy or extension failure
    Transport,
    /// Deadline elapsed
    Timeout,
    /// Signing or submission through the ledger failed
    Ledger,
    /// Envelope, arguments or amount could not be interpreted
    Validation,
    /// Pre-request or test script raised
    Script,
}

/// Error detail of a failed execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure class
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

impl FailureDetail {
    /// New detail
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Response state of the session
///
/// `Loading` is the only non-terminal variant. An execution pushes at most one
/// `Loading` followed by exactly one terminal variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RestResponse {
    /// Request in flight
    Loading {
        /// Request snapshot being executed
        req: RestRequest,
    },
    /// Backend or ledger returned a result
    Success {
        /// HTTP status, synthetic 200 for transaction outcomes
        status_code: u16,
        /// Raw body bytes
        body: Vec<u8>,
        /// Header list, empty for transaction outcomes
        headers: Vec<ResponseHeader>,
        /// Size and timing
        meta: ResponseMeta,
        /// Request snapshot that produced this response
        req: RestRequest,
    },
    /// Transport or signing failure
    NetworkFail {
        /// Failure detail
        error: FailureDetail,
        /// Request snapshot that failed
        req: RestRequest,
    },
    /// Pre-request or test script failure
    ScriptFail {
        /// Failure detail
        error: FailureDetail,
    },
}

impl RestResponse {
    /// Check if this is the in-flight state
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Check if this is a terminal state
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    /// Check if this is a success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Wire name of the variant
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "loading",
            Self::Success { .. } => "success",
            Self::NetworkFail { .. } => "network_fail",
            Self::ScriptFail { .. } => "script_fail",
        }
    }

    /// Request snapshot, absent for script failures
    #[must_use]
    pub fn request(&self) -> Option<&RestRequest> {
        match self {
            Self::Loading { req }
            | Self::Success { req, .. }
            | Self::NetworkFail { req, .. } => Some(req),
            Self::ScriptFail { .. } => None,
        }
    }

    /// Failure detail of failed variants
    #[must_use]
    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            Self::NetworkFail { error, .. } | Self::ScriptFail { error } => Some(error),
            _ => None,
        }
    }

    /// Status code of a success
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Metadata of a success
    #[must_use]
    pub fn meta(&self) -> Option<&ResponseMeta> {
        match self {
            Self::Success { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Body as display text
    ///
    /// Empty for non-success variants. Trailing NUL bytes are stripped. With
    /// `format`, a JSON-RPC reply whose `result.result` is a byte array is
    /// replaced by those bytes decoded as JSON, and any JSON is pretty printed.
    #[must_use]
    pub fn body_text(&self, format: bool) -> String {
        let Self::Success { body, .. } = self else {
            return String::new();
        };
        let end = body.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let text = String::from_utf8_lossy(&body[..end]).into_owned();
        if !format {
            return text;
        }

        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            return text;
        };
        let shown = decode_result_bytes(&value).unwrap_or(value);
        serde_json::to_string_pretty(&shown).unwrap_or(text)
    }
}

/// Decode `result.result` when it is a JSON byte array holding JSON text
fn decode_result_bytes(value: &Value) -> Option<Value> {
    let bytes = value
        .get("result")?
        .get("result")?
        .as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<Vec<u8>>>()?;
    if bytes.is_empty() {
        return Some(Value::Null);
    }
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn success(body: &[u8]) -> RestResponse {
        RestResponse::Success {
            status_code: 200,
            body: body.to_vec(),
            headers: vec![ResponseHeader::new("content-type", "application/json")],
            meta: ResponseMeta {
                response_size: Some(body.len() as u64),
                response_duration: 12,
            },
            req: RestRequest::default(),
        }
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(success(b"{}")).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["meta"]["responseSize"], 2);
        assert_eq!(json["meta"]["responseDuration"], 12);

        let fail = RestResponse::NetworkFail {
            error: FailureDetail::new(FailureKind::Timeout, "deadline elapsed"),
            req: RestRequest::default(),
        };
        let json = serde_json::to_value(&fail).unwrap();
        assert_eq!(json["type"], "network_fail");
        assert_eq!(json["error"]["kind"], "timeout");
    }

    #[test]
    fn write_meta_omits_size() {
        let meta = ResponseMeta {
            response_size: None,
            response_duration: 5,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"responseDuration":5}"#);
    }

    #[test]
    fn body_text_strips_trailing_nuls() {
        assert_eq!(success(b"hello\0\0").body_text(false), "hello");
        assert_eq!(success(b"\0").body_text(false), "");
    }

    #[test]
    fn body_text_decodes_result_bytes() {
        // [34, 111, 107, 34] is "ok" as JSON text
        let body = br#"{"jsonrpc":"2.0","result":{"result":[34,111,107,34],"logs":[]},"id":"x"}"#;
        assert_eq!(success(body).body_text(true), "\"ok\"");
    }

    #[test]
    fn body_text_pretty_prints_plain_json() {
        assert_eq!(success(br#"{"a":1}"#).body_text(true), "{\n  \"a\": 1\n}");
        assert_eq!(success(b"not json").body_text(true), "not json");
    }

    #[test]
    fn non_success_has_no_body() {
        let loading = RestResponse::Loading {
            req: RestRequest::default(),
        };
        assert_eq!(loading.body_text(true), "");
        assert!(loading.is_loading());
        assert!(!loading.is_terminal());
        assert_eq!(loading.type_name(), "loading");

        let script = RestResponse::ScriptFail {
            error: FailureDetail::new(FailureKind::Script, "boom"),
        };
        assert!(script.request().is_none());
        assert_eq!(script.failure().map(|f| f.message.as_str()), Some("boom"));
    }
}
