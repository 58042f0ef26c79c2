//! Connection Manager
//!
//! Owns the live and archival connections, the signed-in account and the last
//! observed block height. Constructed once with [`ConnectionManager::initialize`]
//! and shared by `Arc`; a manager value only exists after initialization has
//! succeeded, so every accessor is valid on every instance.

use crate::account::{view_on, FunctionCallRequest, TransactionSigner, ViewCaller, WalletAccount};
use crate::error::LedgerError;
use crate::key_store::KeyStore;
use crate::provider::{BlockReference, JsonRpcProvider, LedgerProvider};
use crate::router::{BlockHeightSource, BlockRouter, Route};
use async_trait::async_trait;
use chainreq_types::LedgerConfig;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live and archival connections plus the signing account
pub struct ConnectionManager {
    config: LedgerConfig,
    router: BlockRouter,
    key_store: Arc<dyn KeyStore>,
    account: RwLock<Arc<WalletAccount>>,
    archival: Arc<dyn LedgerProvider>,
    last_block_height: AtomicU64,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("network_id", &self.config.network_id)
            .field("live", &self.live_connection().url())
            .field("archival", &self.archival.url())
            .field("last_block_height", &self.last_block_height())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Connect to the configured live and archival nodes over JSON-RPC
    ///
    /// # Errors
    /// `LedgerError::ConnectionFailed` if the live node cannot be reached;
    /// there is no retry
    pub async fn initialize(
        config: LedgerConfig,
        key_store: Arc<dyn KeyStore>,
    ) -> Result<Self, LedgerError> {
        let live: Arc<dyn LedgerProvider> = Arc::new(JsonRpcProvider::new(config.node_url.clone())?);
        let archival: Arc<dyn LedgerProvider> =
            Arc::new(JsonRpcProvider::new(config.archival_node_url.clone())?);
        Self::connect(config, live, archival, key_store).await
    }

    /// Connect over given providers
    ///
    /// Derives the account from the live provider and records the latest final
    /// block height.
    ///
    /// # Errors
    /// `LedgerError::ConnectionFailed` if the live provider cannot serve the
    /// final block
    pub async fn connect(
        config: LedgerConfig,
        live: Arc<dyn LedgerProvider>,
        archival: Arc<dyn LedgerProvider>,
        key_store: Arc<dyn KeyStore>,
    ) -> Result<Self, LedgerError> {
        let header = live
            .block(BlockReference::final_block())
            .await
            .map_err(|e| {
                tracing::error!(url = %live.url(), error = %e, "Live connection failed");
                LedgerError::ConnectionFailed {
                    url: live.url().to_string(),
                    reason: e.to_string(),
                }
            })?;

        let account = WalletAccount::new(
            config.account_id.clone(),
            config.network_id.clone(),
            Arc::clone(&live),
            Arc::clone(&key_store),
        );

        tracing::info!(
            network = %config.network_id,
            live = %live.url(),
            archival = %archival.url(),
            height = header.height,
            account = ?config.account_id,
            "Ledger connection established"
        );

        Ok(Self {
            router: BlockRouter::new(config.retention_window_blocks),
            config,
            key_store,
            account: RwLock::new(Arc::new(account)),
            archival,
            last_block_height: AtomicU64::new(header.height),
        })
    }

    /// Network configuration
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Router over the configured retention window
    #[must_use]
    pub fn router(&self) -> BlockRouter {
        self.router
    }

    /// Signed-in account handle
    #[must_use]
    pub fn account(&self) -> Arc<WalletAccount> {
        Arc::clone(&self.account.read())
    }

    /// Live connection
    #[must_use]
    pub fn live_connection(&self) -> Arc<dyn LedgerProvider> {
        self.account.read().provider()
    }

    /// Archival connection; fixed for the manager's lifetime
    #[must_use]
    pub fn archival_connection(&self) -> Arc<dyn LedgerProvider> {
        Arc::clone(&self.archival)
    }

    /// Last observed block height
    #[must_use]
    pub fn last_block_height(&self) -> u64 {
        self.last_block_height.load(Ordering::Acquire)
    }

    /// Fetch the latest optimistic height from the live connection
    ///
    /// Safe to run alongside executions; the last completed refresh wins.
    ///
    /// # Errors
    /// Transport or RPC failure; the cached height is left unchanged
    pub async fn refresh_block_height(&self) -> Result<u64, LedgerError> {
        let live = self.live_connection();
        let header = live.block(BlockReference::optimistic()).await?;
        self.last_block_height.store(header.height, Ordering::Release);
        tracing::debug!(height = header.height, "Refreshed block height");
        Ok(header.height)
    }

    /// Replace the live connection
    ///
    /// The signed-in account carries over. Passing a different account than the
    /// one already signed in is rejected.
    ///
    /// # Errors
    /// `LedgerError::AccountMismatch` when `account_id` differs from the
    /// current signed-in account
    pub fn reconnect_live(
        &self,
        live: Arc<dyn LedgerProvider>,
        account_id: Option<String>,
    ) -> Result<(), LedgerError> {
        let mut slot = self.account.write();
        let current = slot.account_id().map(str::to_owned);
        let account_id = match (current, account_id) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(LedgerError::AccountMismatch { expected, actual });
            }
            (current, offered) => offered.or(current),
        };
        tracing::info!(live = %live.url(), account = ?account_id, "Live connection re-established");
        *slot = Arc::new(WalletAccount::new(
            account_id,
            self.config.network_id.clone(),
            live,
            Arc::clone(&self.key_store),
        ));
        Ok(())
    }

    /// Route for a target height against the last observed height
    #[must_use]
    pub fn route_for(&self, target_height: u64) -> Route {
        self.router.route(target_height, self.last_block_height())
    }

    /// Connection serving a target height
    #[must_use]
    pub fn connection_for(&self, target_height: u64) -> Arc<dyn LedgerProvider> {
        match self.route_for(target_height) {
            Route::Live => self.live_connection(),
            Route::Archival => self.archival_connection(),
        }
    }

    /// View call on the configured contract at a block height
    ///
    /// Blocks older than the retention window are read from the archival node.
    /// An empty result decodes to `null`.
    ///
    /// # Errors
    /// - `LedgerError::InvalidArgs` if `args` is not a JSON object
    /// - transport, RPC or decoding failure
    pub async fn view_at_block(
        &self,
        block_id: u64,
        method_name: &str,
        args: &Value,
    ) -> Result<Value, LedgerError> {
        let route = self.route_for(block_id);
        tracing::debug!(
            block_id,
            observed = self.last_block_height(),
            route = route.as_str(),
            method = method_name,
            "Routing view call"
        );
        let connection = match route {
            Route::Live => self.live_connection(),
            Route::Archival => self.archival_connection(),
        };
        view_on(
            connection.as_ref(),
            &self.config.contract_name,
            method_name,
            args,
            BlockReference::height(block_id),
        )
        .await
    }
}

impl BlockHeightSource for ConnectionManager {
    fn last_block_height(&self) -> u64 {
        ConnectionManager::last_block_height(self)
    }
}

#[async_trait]
impl ViewCaller for ConnectionManager {
    async fn view_function(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
        reference: BlockReference,
    ) -> Result<Value, LedgerError> {
        self.account()
            .view_function(contract_id, method_name, args, reference)
            .await
    }
}

#[async_trait]
impl TransactionSigner for ConnectionManager {
    fn signer_account_id(&self) -> Option<String> {
        self.account().signer_account_id()
    }

    async fn function_call(&self, request: FunctionCallRequest) -> Result<Value, LedgerError> {
        self.account().function_call(request).await
    }
}
