//! Ledger call envelope embedded in JSON request bodies
//!
//! A raw JSON body carries a JSON-RPC `query` envelope whose `params` name the
//! call kind, the target account, the contract method and the base64 encoded
//! argument bytes. The structured request fields are the source of truth; the
//! envelope is re-derived from them on every mutation.

use crate::error::TypesError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire value of the envelope's call type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Read-only view call
    #[serde(rename = "call_function")]
    CallFunction,
    /// Signed state-changing call
    #[serde(rename = "write_function")]
    WriteFunction,
}

impl RequestType {
    /// Check if this call needs a signed transaction
    #[inline]
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::WriteFunction)
    }

    /// Wire string
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CallFunction => "call_function",
            Self::WriteFunction => "write_function",
        }
    }
}

/// Block finality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Finality {
    /// Latest observed block
    #[default]
    #[serde(rename = "optimistic")]
    Optimistic,
    /// Doomslug-final block
    #[serde(rename = "near-final")]
    NearFinal,
    /// Irreversibly committed block
    #[serde(rename = "final")]
    Final,
}

impl Finality {
    /// Wire string
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::NearFinal => "near-final",
            Self::Final => "final",
        }
    }
}

/// Block identifier: height or base58 hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    /// Block height
    Height(u64),
    /// Block hash
    Hash(String),
}

/// `params` object of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    /// Call kind
    pub request_type: RequestType,
    /// Target contract account
    #[serde(default)]
    pub account_id: String,
    /// Contract method
    #[serde(default)]
    pub method_name: String,
    /// Base64 of the JSON argument object
    #[serde(default)]
    pub args_base64: String,
    /// Finality, when not pinned to a block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finality: Option<Finality>,
    /// Pinned block, when not using finality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<BlockId>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON-RPC call envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// RPC method, normally `query`
    pub method: String,
    /// Call parameters
    pub params: EnvelopeParams,
    /// RPC request id
    #[serde(default)]
    pub id: String,
    /// RPC version
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Default for CallEnvelope {
    fn default() -> Self {
        Self {
            method: "query".to_string(),
            params: EnvelopeParams {
                request_type: RequestType::CallFunction,
                account_id: String::new(),
                method_name: String::new(),
                args_base64: String::new(),
                finality: Some(Finality::Optimistic),
                block_id: None,
                extra: Map::new(),
            },
            id: String::new(),
            jsonrpc: default_jsonrpc(),
        }
    }
}

impl CallEnvelope {
    /// Parse envelope from body text
    ///
    /// # Errors
    /// `TypesError::InvalidEnvelope` if the text is not a JSON envelope
    pub fn parse(text: &str) -> Result<Self, TypesError> {
        serde_json::from_str(text).map_err(|e| TypesError::InvalidEnvelope(e.to_string()))
    }

    /// Serialize to compact JSON text
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Call kind
    #[inline]
    #[must_use]
    pub fn request_type(&self) -> RequestType {
        self.params.request_type
    }

    /// Decode `args_base64` into the argument object
    ///
    /// An empty `args_base64` decodes to an empty map.
    ///
    /// # Errors
    /// `TypesError::InvalidArgs` if the field is not base64 of a JSON object
    pub fn decoded_args(&self) -> Result<IndexMap<String, Value>, TypesError> {
        decode_args(&self.params.args_base64)
    }
}

/// Encode an argument map as base64 of its JSON text
#[must_use]
pub fn encode_args(args: &IndexMap<String, String>) -> String {
    let json = serde_json::to_string(args).unwrap_or_else(|_| "{}".to_string());
    BASE64_STANDARD.encode(json.as_bytes())
}

/// Decode base64 JSON argument bytes
///
/// # Errors
/// `TypesError::InvalidArgs` on bad base64, bad UTF-8 JSON or a non-object value
pub fn decode_args(args_base64: &str) -> Result<IndexMap<String, Value>, TypesError> {
    if args_base64.is_empty() {
        return Ok(IndexMap::new());
    }
    let bytes = BASE64_STANDARD
        .decode(args_base64)
        .map_err(|e| TypesError::InvalidArgs(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TypesError::InvalidArgs(e.to_string()))
}

/// Rewrite the `params` object of envelope text in place
///
/// Unparseable text, or text that is not a JSON object, is replaced by the
/// default envelope before `patch` runs, so the result is always a valid
/// envelope carrying the patched fields.
pub fn patch_params(text: &str, patch: impl FnOnce(&mut Map<String, Value>)) -> String {
    let mut root = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        _ => match serde_json::to_value(CallEnvelope::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
    };

    let params = root
        .entry("params")
        .or_insert_with(|| Value::Object(Map::new()));
    if !params.is_object() {
        *params = Value::Object(Map::new());
    }
    if let Value::Object(params) = params {
        patch(params);
    }

    serde_json::to_string(&Value::Object(root)).unwrap_or_default()
}
