//! The request value object
//!
//! A [`RestRequest`] is edited through its structured fields (`endpoint`,
//! `params`, `call_kind`, `auth`). A JSON body mirrors those fields in its
//! [`CallEnvelope`]; [`RestRequest::sync_envelope`] re-derives the envelope and
//! must run after every structured mutation.

use crate::body::{ContentType, RestReqBody};
use crate::envelope::{self, encode_args, CallEnvelope, RequestType};
use crate::error::TypesError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Schema version stamped on new requests
pub const REST_REQ_SCHEMA_VERSION: &str = "1";

/// Live RPC node used by the default request template
pub const DEFAULT_RPC_URL: &str = "https://rpc.testnet.near.org";

/// Query parameter; becomes a contract argument when active
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestParam {
    /// Argument name
    pub key: String,
    /// Argument value
    pub value: String,
    /// Inactive params are kept but never sent
    pub active: bool,
}

impl RestParam {
    /// Active param
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            active: true,
        }
    }

    /// Same param, marked inactive
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Request header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestHeader {
    /// Header name
    pub key: String,
    /// Header value
    pub value: String,
    /// Inactive headers are kept but never sent
    pub active: bool,
}

impl RestHeader {
    /// Active header
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            active: true,
        }
    }
}

/// Active `(key, value)` pairs in list order, last key wins
///
/// A repeated key keeps the position of its first occurrence.
pub fn active_entries<'a, I>(entries: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str, bool)>,
{
    let mut out = IndexMap::new();
    for (key, value, active) in entries {
        if active {
            out.insert(key.to_string(), value.to_string());
        }
    }
    out
}

/// Transport method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    #[default]
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Method name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call kind as the user picks it
///
/// `NonPayable` and `Payable` both submit a signed transaction; only a
/// payable call is expected to attach an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallKind {
    /// Read-only view call
    #[default]
    View,
    /// Signed call without attached value
    NonPayable,
    /// Signed call that may attach value
    Payable,
}

impl CallKind {
    /// Envelope call type for this kind
    #[inline]
    #[must_use]
    pub fn request_type(self) -> RequestType {
        match self {
            Self::View => RequestType::CallFunction,
            Self::NonPayable | Self::Payable => RequestType::WriteFunction,
        }
    }

    /// Kind recovered from an envelope call type
    #[inline]
    #[must_use]
    pub fn from_request_type(request_type: RequestType) -> Self {
        match request_type {
            RequestType::CallFunction => Self::View,
            RequestType::WriteFunction => Self::NonPayable,
        }
    }

    /// Check if this kind needs a signed transaction
    #[inline]
    #[must_use]
    pub fn is_write(self) -> bool {
        self.request_type().is_write()
    }

    /// Display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::NonPayable => "NONPAYABLE",
            Self::Payable => "PAYABLE",
        }
    }
}

impl FromStr for CallKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VIEW" => Ok(Self::View),
            "NONPAYABLE" => Ok(Self::NonPayable),
            "PAYABLE" => Ok(Self::Payable),
            other => Err(format!("unknown call kind: {other}")),
        }
    }
}

/// Authentication descriptor variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authType", rename_all = "kebab-case")]
pub enum AuthKind {
    /// No signing account
    None,
    /// Calls are signed by this account
    SignedAccount {
        /// Signing account; also the envelope's target account
        #[serde(rename = "token")]
        account_id: String,
        /// Attached amount in whole units, decimal text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<String>,
    },
}

/// Authentication descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestAuth {
    /// Inactive auth is ignored
    pub auth_active: bool,
    /// Auth variant
    #[serde(flatten)]
    pub kind: AuthKind,
}

impl Default for RestAuth {
    fn default() -> Self {
        Self::none()
    }
}

impl RestAuth {
    /// No auth
    #[must_use]
    pub fn none() -> Self {
        Self {
            auth_active: true,
            kind: AuthKind::None,
        }
    }

    /// Signed-account auth
    #[must_use]
    pub fn signed(account_id: impl Into<String>, amount: Option<String>) -> Self {
        Self {
            auth_active: true,
            kind: AuthKind::SignedAccount {
                account_id: account_id.into(),
                amount,
            },
        }
    }

    /// Signing account, when auth is active and names one
    #[must_use]
    pub fn signing_account(&self) -> Option<&str> {
        match &self.kind {
            AuthKind::SignedAccount { account_id, .. } if self.auth_active && !account_id.is_empty() => {
                Some(account_id)
            }
            _ => None,
        }
    }

    /// Attached amount text, when auth is active and sets one
    #[must_use]
    pub fn attached_amount(&self) -> Option<&str> {
        match &self.kind {
            AuthKind::SignedAccount {
                amount: Some(amount),
                ..
            } if self.auth_active && !amount.trim().is_empty() => Some(amount),
            _ => None,
        }
    }
}

/// A request as edited in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestRequest {
    /// Schema version
    pub v: String,
    /// Display name
    pub name: String,
    /// Service URL the call is sent to
    pub url: String,
    /// Contract method name
    pub endpoint: String,
    /// Transport method; fixed to POST for ledger calls
    pub method: HttpMethod,
    /// View or write
    pub call_kind: CallKind,
    /// Ordered params
    pub params: Vec<RestParam>,
    /// Ordered headers
    pub headers: Vec<RestHeader>,
    /// Auth descriptor
    pub auth: RestAuth,
    /// Script run before execution
    pub pre_request_script: String,
    /// Script run against the response
    pub test_script: String,
    /// Body
    pub body: RestReqBody,
}

impl Default for RestRequest {
    fn default() -> Self {
        let mut request = Self {
            v: REST_REQ_SCHEMA_VERSION.to_string(),
            name: "Untitled request".to_string(),
            url: DEFAULT_RPC_URL.to_string(),
            endpoint: String::new(),
            method: HttpMethod::Post,
            call_kind: CallKind::View,
            params: Vec::new(),
            headers: Vec::new(),
            auth: RestAuth::none(),
            pre_request_script: String::new(),
            test_script: String::new(),
            body: RestReqBody::raw(
                ContentType::ApplicationJson,
                CallEnvelope::default().to_json_string(),
            ),
        };
        request.sync_envelope();
        request
    }
}

impl RestRequest {
    /// Active params as the contract argument map
    #[must_use]
    pub fn active_args(&self) -> IndexMap<String, String> {
        active_entries(
            self.params
                .iter()
                .map(|p| (p.key.as_str(), p.value.as_str(), p.active)),
        )
    }

    /// Active headers, last key wins
    #[must_use]
    pub fn active_headers(&self) -> IndexMap<String, String> {
        active_entries(
            self.headers
                .iter()
                .map(|h| (h.key.as_str(), h.value.as_str(), h.active)),
        )
    }

    /// Re-derive the embedded envelope from the structured fields
    ///
    /// Only JSON bodies carry an envelope; other bodies are left untouched.
    pub fn sync_envelope(&mut self) {
        let args_base64 = encode_args(&self.active_args());
        let method_name = self.endpoint.clone();
        let request_type = self.call_kind.request_type();
        let account_id = self.auth.signing_account().map(str::to_owned);

        if let RestReqBody::Raw { content_type, body } = &mut self.body {
            if !content_type.is_json() {
                return;
            }
            *body = envelope::patch_params(body, |params| {
                params.insert("request_type".into(), Value::from(request_type.as_str()));
                params.insert("method_name".into(), Value::from(method_name));
                params.insert("args_base64".into(), Value::from(args_base64));
                match account_id {
                    Some(account_id) => {
                        params.insert("account_id".into(), Value::from(account_id));
                    }
                    None => {
                        params.remove("account_id");
                    }
                }
            });
        }
    }

    /// Parse the embedded envelope
    ///
    /// # Errors
    /// - `TypesError::MissingEnvelope` for non-JSON bodies
    /// - `TypesError::InvalidEnvelope` for unparseable body text
    pub fn envelope(&self) -> Result<CallEnvelope, TypesError> {
        match &self.body {
            RestReqBody::Raw { content_type, body } if content_type.is_json() => {
                CallEnvelope::parse(body)
            }
            _ => Err(TypesError::MissingEnvelope),
        }
    }
}
