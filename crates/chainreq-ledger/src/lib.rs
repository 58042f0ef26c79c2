//! Ledger side of chainreq
//!
//! - [`ConnectionManager`]: live and archival connections, signed-in account,
//!   last observed block height
//! - [`BlockRouter`]: live vs archival choice by block age
//! - [`WalletAccount`]: the account handle, exposed through the
//!   [`ViewCaller`] and [`TransactionSigner`] facets
//! - [`KeyStore`], [`LedgerProvider`] and transaction encoding underneath
//!
//! # Example
//!
//! ```rust,ignore
//! use chainreq_ledger::{ConnectionManager, InMemoryKeyStore};
//! use chainreq_types::LedgerConfig;
//! use std::sync::Arc;
//!
//! let manager = ConnectionManager::initialize(LedgerConfig::default(), Arc::new(InMemoryKeyStore::new())).await?;
//! let posts = manager.view_at_block(100, "get_posts", &serde_json::json!({})).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod account;
pub mod amount;
pub mod contract_address;
pub mod error;
pub mod key_store;
pub mod manager;
pub mod provider;
pub mod router;
pub mod transaction;

pub use account::{FunctionCallRequest, TransactionSigner, ViewCaller, WalletAccount};
pub use amount::{parse_near_amount, NEAR_NOMINATION_EXP};
pub use contract_address::{
    ContractAddressStore, JsonFileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    CONTRACT_ADDRESS_KEY,
};
pub use error::LedgerError;
pub use key_store::{FileKeyStore, InMemoryKeyStore, KeyPair, KeyStore};
pub use manager::ConnectionManager;
pub use provider::{
    AccessKeyView, BlockHeader, BlockReference, CallResult, JsonRpcProvider, LedgerProvider,
    QueryRequest,
};
pub use router::{BlockHeightSource, BlockRouter, Route, DEFAULT_RETENTION_WINDOW};
pub use transaction::{Action, FunctionCallAction, PublicKey, Signature, SignedTransaction, Transaction};
