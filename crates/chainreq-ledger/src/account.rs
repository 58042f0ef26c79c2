//! Account handle with its two facets
//!
//! [`ViewCaller`] issues read-only contract calls; [`TransactionSigner`]
//! builds, signs and submits function-call transactions. [`WalletAccount`]
//! implements both over one live provider and the key store.

use crate::error::LedgerError;
use crate::key_store::KeyStore;
use crate::provider::{AccessKeyView, BlockReference, CallResult, LedgerProvider, QueryRequest};
use crate::transaction::{
    decode_block_hash, FunctionCallAction, PublicKey, SignedTransaction, Transaction,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Read-only contract calls
#[async_trait]
pub trait ViewCaller: Send + Sync {
    /// Call a view method; the result bytes are decoded as JSON
    async fn view_function(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
        reference: BlockReference,
    ) -> Result<Value, LedgerError>;
}

/// Function call to sign and submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallRequest {
    /// Contract account
    pub receiver_id: String,
    /// Method
    pub method_name: String,
    /// String arguments, serialized as a JSON object
    pub args: IndexMap<String, String>,
    /// Attached gas
    pub gas: u64,
    /// Attached amount in yocto units
    pub deposit: u128,
}

/// Signed state-changing calls
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Signed-in account, if any
    fn signer_account_id(&self) -> Option<String>;

    /// Sign and submit; returns the transaction outcome
    async fn function_call(&self, request: FunctionCallRequest) -> Result<Value, LedgerError>;
}

/// Encode a JSON argument object as base64
///
/// `null` is treated as an empty object.
///
/// # Errors
/// `LedgerError::InvalidArgs` for anything other than an object or `null`
pub fn encode_json_args(args: &Value) -> Result<String, LedgerError> {
    let bytes = match args {
        Value::Object(_) => serde_json::to_vec(args)?,
        Value::Null => b"{}".to_vec(),
        other => {
            return Err(LedgerError::InvalidArgs(format!(
                "expected an object, got {other}"
            )))
        }
    };
    Ok(BASE64_STANDARD.encode(bytes))
}

/// Account bound to a live connection and the key store
pub struct WalletAccount {
    account_id: Option<String>,
    network_id: String,
    provider: Arc<dyn LedgerProvider>,
    key_store: Arc<dyn KeyStore>,
}

impl std::fmt::Debug for WalletAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletAccount")
            .field("account_id", &self.account_id)
            .field("network_id", &self.network_id)
            .field("provider", &self.provider.url())
            .finish_non_exhaustive()
    }
}

impl WalletAccount {
    /// Account handle; `None` means no one is signed in
    #[must_use]
    pub fn new(
        account_id: Option<String>,
        network_id: impl Into<String>,
        provider: Arc<dyn LedgerProvider>,
        key_store: Arc<dyn KeyStore>,
    ) -> Self {
        Self {
            account_id,
            network_id: network_id.into(),
            provider,
            key_store,
        }
    }

    /// Signed-in account
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Check if an account is signed in
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.account_id.is_some()
    }

    /// Network name
    #[must_use]
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// Live connection this account talks through
    #[must_use]
    pub fn provider(&self) -> Arc<dyn LedgerProvider> {
        Arc::clone(&self.provider)
    }

    /// Build and sign a transaction without submitting it
    ///
    /// # Errors
    /// - `LedgerError::NotSignedIn` without an account
    /// - `LedgerError::KeyNotFound` when the key store has no key
    /// - `LedgerError::NonceOverflow` when the access key nonce is at its maximum
    /// - RPC errors from the nonce and block hash lookups
    pub async fn sign_function_call(
        &self,
        request: &FunctionCallRequest,
    ) -> Result<SignedTransaction, LedgerError> {
        let account_id = self.account_id.as_deref().ok_or(LedgerError::NotSignedIn)?;
        let key = self
            .key_store
            .get_key(&self.network_id, account_id)?
            .ok_or_else(|| LedgerError::KeyNotFound {
                account_id: account_id.to_string(),
                network_id: self.network_id.clone(),
            })?;

        let access_key = self
            .provider
            .query(QueryRequest::ViewAccessKey {
                account_id: account_id.to_string(),
                public_key: key.public_key_string(),
                reference: BlockReference::final_block(),
            })
            .await?;
        let access_key: AccessKeyView = serde_json::from_value(access_key)?;

        let nonce = access_key
            .nonce
            .checked_add(1)
            .ok_or_else(|| LedgerError::NonceOverflow(account_id.to_string()))?;

        let block = self.provider.block(BlockReference::final_block()).await?;
        let block_hash = decode_block_hash(&block.hash)?;

        let args = serde_json::to_vec(&request.args)?;
        let tx = Transaction::function_call(
            account_id,
            PublicKey(key.public_key_bytes()),
            nonce,
            request.receiver_id.clone(),
            block_hash,
            FunctionCallAction {
                method_name: request.method_name.clone(),
                args,
                gas: request.gas,
                deposit: request.deposit,
            },
        );
        tx.sign(&key)
    }
}

#[async_trait]
impl ViewCaller for WalletAccount {
    async fn view_function(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
        reference: BlockReference,
    ) -> Result<Value, LedgerError> {
        view_on(self.provider.as_ref(), contract_id, method_name, args, reference).await
    }
}

#[async_trait]
impl TransactionSigner for WalletAccount {
    fn signer_account_id(&self) -> Option<String> {
        self.account_id.clone()
    }

    async fn function_call(&self, request: FunctionCallRequest) -> Result<Value, LedgerError> {
        let signed = self.sign_function_call(&request).await?;
        tracing::info!(
            signer = %signed.transaction.signer_id,
            receiver = %request.receiver_id,
            method = %request.method_name,
            nonce = signed.transaction.nonce,
            "Submitting function call"
        );
        self.provider.broadcast_tx_commit(signed.to_base64()?).await
    }
}

/// View call through a specific provider
pub(crate) async fn view_on(
    provider: &dyn LedgerProvider,
    contract_id: &str,
    method_name: &str,
    args: &Value,
    reference: BlockReference,
) -> Result<Value, LedgerError> {
    let args_base64 = encode_json_args(args)?;
    let result = provider
        .query(QueryRequest::CallFunction {
            account_id: contract_id.to_string(),
            method_name: method_name.to_string(),
            args_base64,
            reference,
        })
        .await?;
    let result: CallResult = serde_json::from_value(result)?;
    result.json()
}
