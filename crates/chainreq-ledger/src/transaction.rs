//! Function-call transactions in the ledger's borsh wire format

use crate::error::LedgerError;
use crate::key_store::KeyPair;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use borsh::{to_vec, BorshSerialize};
use sha2::{Digest, Sha256};
use std::io::{Result as IoResult, Write};

/// Key type tag of ed25519 keys and signatures
const ED25519_TAG: u8 = 0;

/// Action index of `FunctionCall` in the ledger's action enum
const FUNCTION_CALL_INDEX: u8 = 2;

/// ed25519 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl BorshSerialize for PublicKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(&[ED25519_TAG])?;
        writer.write_all(&self.0)
    }
}

/// ed25519 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl BorshSerialize for Signature {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(&[ED25519_TAG])?;
        writer.write_all(&self.0)
    }
}

/// Contract method invocation
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct FunctionCallAction {
    /// Method
    pub method_name: String,
    /// JSON argument bytes
    pub args: Vec<u8>,
    /// Attached gas
    pub gas: u64,
    /// Attached amount in yocto units
    pub deposit: u128,
}

/// Transaction action; only function calls are issued by this client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Function call
    FunctionCall(FunctionCallAction),
}

impl BorshSerialize for Action {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        match self {
            Self::FunctionCall(call) => {
                writer.write_all(&[FUNCTION_CALL_INDEX])?;
                call.serialize(writer)
            }
        }
    }
}

/// Unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct Transaction {
    /// Signing account
    pub signer_id: String,
    /// Signing key
    pub public_key: PublicKey,
    /// Access key nonce, one past the last used
    pub nonce: u64,
    /// Contract account
    pub receiver_id: String,
    /// Recent block hash
    pub block_hash: [u8; 32],
    /// Actions in order
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Single function-call transaction
    #[must_use]
    pub fn function_call(
        signer_id: impl Into<String>,
        public_key: PublicKey,
        nonce: u64,
        receiver_id: impl Into<String>,
        block_hash: [u8; 32],
        call: FunctionCallAction,
    ) -> Self {
        Self {
            signer_id: signer_id.into(),
            public_key,
            nonce,
            receiver_id: receiver_id.into(),
            block_hash,
            actions: vec![Action::FunctionCall(call)],
        }
    }

    /// SHA-256 of the borsh encoding
    ///
    /// # Errors
    /// `LedgerError::Encoding` if serialization fails
    pub fn hash(&self) -> Result<[u8; 32], LedgerError> {
        let bytes = to_vec(self).map_err(|e| LedgerError::Encoding(e.to_string()))?;
        Ok(Sha256::digest(&bytes).into())
    }

    /// Sign the transaction hash
    ///
    /// # Errors
    /// `LedgerError::Encoding` if serialization fails
    pub fn sign(self, key: &KeyPair) -> Result<SignedTransaction, LedgerError> {
        let hash = self.hash()?;
        let signature = Signature(key.sign(&hash).to_bytes());
        Ok(SignedTransaction {
            transaction: self,
            signature,
        })
    }
}

/// Transaction with its signature
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct SignedTransaction {
    /// Transaction
    pub transaction: Transaction,
    /// Signature over the transaction hash
    pub signature: Signature,
}

impl SignedTransaction {
    /// Base64 of the borsh encoding, as `broadcast_tx_commit` expects
    ///
    /// # Errors
    /// `LedgerError::Encoding` if serialization fails
    pub fn to_base64(&self) -> Result<String, LedgerError> {
        let bytes = to_vec(self).map_err(|e| LedgerError::Encoding(e.to_string()))?;
        Ok(BASE64_STANDARD.encode(bytes))
    }
}

/// Decode a base58 block hash
///
/// # Errors
/// `LedgerError::Encoding` on bad base58 or a length other than 32
pub fn decode_block_hash(hash: &str) -> Result<[u8; 32], LedgerError> {
    let bytes = bs58::decode(hash)
        .into_vec()
        .map_err(|e| LedgerError::Encoding(format!("block hash: {e}")))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| LedgerError::Encoding(format!("block hash has {} bytes", bytes.len())))
}
