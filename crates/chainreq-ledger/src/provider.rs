//! JSON-RPC access to a ledger node

use crate::error::LedgerError;
use async_trait::async_trait;
use chainreq_types::{BlockId, Finality};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default per-call timeout of [`JsonRpcProvider`]
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Block selector for reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReference {
    /// Latest block at a finality level
    Finality(Finality),
    /// Specific block
    BlockId(BlockId),
}

impl BlockReference {
    /// Latest final block
    #[must_use]
    pub fn final_block() -> Self {
        Self::Finality(Finality::Final)
    }

    /// Latest optimistic block
    #[must_use]
    pub fn optimistic() -> Self {
        Self::Finality(Finality::Optimistic)
    }

    /// Block at a height
    #[must_use]
    pub fn height(height: u64) -> Self {
        Self::BlockId(BlockId::Height(height))
    }

    fn write_into(&self, params: &mut Map<String, Value>) {
        match self {
            Self::Finality(finality) => {
                params.insert("finality".into(), Value::from(finality.as_str()));
            }
            Self::BlockId(BlockId::Height(height)) => {
                params.insert("block_id".into(), Value::from(*height));
            }
            Self::BlockId(BlockId::Hash(hash)) => {
                params.insert("block_id".into(), Value::from(hash.as_str()));
            }
        }
    }
}

/// Header fields of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height
    pub height: u64,
    /// Base58 hash
    pub hash: String,
}

/// `query` requests this client issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// View call on a contract
    CallFunction {
        /// Contract account
        account_id: String,
        /// Method
        method_name: String,
        /// Base64 of the JSON argument object
        args_base64: String,
        /// Block to read at
        reference: BlockReference,
    },
    /// Access key of an account, for the nonce
    ViewAccessKey {
        /// Account
        account_id: String,
        /// `ed25519:<base58>` public key
        public_key: String,
        /// Block to read at
        reference: BlockReference,
    },
}

impl QueryRequest {
    /// JSON-RPC params object
    #[must_use]
    pub fn to_params(&self) -> Value {
        let mut params = Map::new();
        match self {
            Self::CallFunction {
                account_id,
                method_name,
                args_base64,
                reference,
            } => {
                params.insert("request_type".into(), Value::from("call_function"));
                params.insert("account_id".into(), Value::from(account_id.as_str()));
                params.insert("method_name".into(), Value::from(method_name.as_str()));
                params.insert("args_base64".into(), Value::from(args_base64.as_str()));
                reference.write_into(&mut params);
            }
            Self::ViewAccessKey {
                account_id,
                public_key,
                reference,
            } => {
                params.insert("request_type".into(), Value::from("view_access_key"));
                params.insert("account_id".into(), Value::from(account_id.as_str()));
                params.insert("public_key".into(), Value::from(public_key.as_str()));
                reference.write_into(&mut params);
            }
        }
        Value::Object(params)
    }
}

/// Result of a `call_function` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Returned bytes, normally JSON text
    #[serde(default)]
    pub result: Vec<u8>,
    /// Contract logs
    #[serde(default)]
    pub logs: Vec<String>,
    /// Height read at
    #[serde(default)]
    pub block_height: u64,
    /// Hash read at
    #[serde(default)]
    pub block_hash: String,
}

impl CallResult {
    /// Decode the returned bytes as JSON; empty bytes decode to `null`
    ///
    /// # Errors
    /// `LedgerError::Json` if the bytes are not JSON
    pub fn json(&self) -> Result<Value, LedgerError> {
        if self.result.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.result)?)
    }
}

/// Result of a `view_access_key` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyView {
    /// Last used nonce
    pub nonce: u64,
    /// Permission descriptor
    #[serde(default)]
    pub permission: Value,
}

/// Connection to one ledger node
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Node URL
    fn url(&self) -> &str;

    /// Block header at a reference
    async fn block(&self, reference: BlockReference) -> Result<BlockHeader, LedgerError>;

    /// `query` call; returns the raw `result` object
    async fn query(&self, request: QueryRequest) -> Result<Value, LedgerError>;

    /// Submit a base64 signed transaction and wait for its outcome
    async fn broadcast_tx_commit(&self, signed_tx_base64: String) -> Result<Value, LedgerError>;
}

/// [`LedgerProvider`] over HTTP JSON-RPC
#[derive(Debug)]
pub struct JsonRpcProvider {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    /// Provider with the default timeout
    ///
    /// # Errors
    /// `LedgerError::Transport` if the HTTP client cannot be built
    pub fn new(url: impl Into<String>) -> Result<Self, LedgerError> {
        Self::with_timeout(url, DEFAULT_RPC_TIMEOUT)
    }

    /// Provider with a per-call timeout
    ///
    /// # Errors
    /// `LedgerError::Transport` if the HTTP client cannot be built
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": params,
        });
        tracing::debug!(url = %self.url, method, id, "Ledger RPC call");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let reply: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Transport(format!("HTTP {status}: {e}")))?;

        if let Some(error) = reply.get("error") {
            return Err(rpc_error(error));
        }
        reply
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Transport("reply has neither result nor error".into()))
    }
}

/// Map a JSON-RPC error object, preferring the most specific message
fn rpc_error(error: &Value) -> LedgerError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
    let message = error
        .get("cause")
        .and_then(|c| c.get("name"))
        .or_else(|| error.get("data"))
        .or_else(|| error.get("message"))
        .map_or_else(
            || error.to_string(),
            |v| v.as_str().map_or_else(|| v.to_string(), str::to_string),
        );
    LedgerError::Rpc { code, message }
}

#[async_trait]
impl LedgerProvider for JsonRpcProvider {
    fn url(&self) -> &str {
        &self.url
    }

    async fn block(&self, reference: BlockReference) -> Result<BlockHeader, LedgerError> {
        let mut params = Map::new();
        reference.write_into(&mut params);
        let result = self.call("block", Value::Object(params)).await?;
        let header = result
            .get("header")
            .cloned()
            .ok_or_else(|| LedgerError::Transport("block reply has no header".into()))?;
        Ok(serde_json::from_value(header)?)
    }

    async fn query(&self, request: QueryRequest) -> Result<Value, LedgerError> {
        let result = self.call("query", request.to_params()).await?;
        // Contract execution errors come back inside a successful reply
        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(LedgerError::Rpc {
                code: -32000,
                message: error.to_string(),
            });
        }
        Ok(result)
    }

    async fn broadcast_tx_commit(&self, signed_tx_base64: String) -> Result<Value, LedgerError> {
        self.call("broadcast_tx_commit", json!([signed_tx_base64])).await
    }
}
