//! Request Executor
//!
//! Runs one effective request to a terminal [`RestResponse`]. Reads go through
//! the backend picked by the [`StrategySelector`]; writes are signed and
//! submitted through the [`TransactionSigner`]. Every failure becomes a
//! `network_fail` response except cancellation, which ends the execution
//! without a terminal response.

use crate::backend::{
    DirectBackend, ExtensionBackend, HttpBackend, InterceptorAgent, ProxyBackend,
};
use crate::error::{ExecutionError, TransportError};
use crate::http::HttpRequest;
use crate::normalizer::{network_fail, normalize_read, normalize_write};
use crate::strategy::{Strategy, StrategySelector};
use chainreq_ledger::{
    parse_near_amount, BlockHeightSource, BlockRouter, ConnectionManager, FunctionCallRequest,
    Route, TransactionSigner,
};
use chainreq_types::{
    BlockId, CallEnvelope, EffectiveRequest, HttpConfig, LedgerConfig, RequestType, RestResponse,
    TypesError,
};
use futures::channel::mpsc;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stream of one execution: `Loading`, then at most one terminal response
pub type ResponseStream = mpsc::UnboundedReceiver<RestResponse>;

/// The three HTTP backends
#[derive(Clone)]
pub struct Backends {
    /// Direct outbound calls
    pub direct: Arc<dyn HttpBackend>,
    /// Forwarding proxy
    pub proxy: Arc<dyn HttpBackend>,
    /// Intercepting extension
    pub extension: Arc<dyn HttpBackend>,
}

impl Backends {
    /// Backends built from HTTP settings over an extension agent
    ///
    /// # Errors
    /// `TransportError::Http` if an HTTP client cannot be built
    pub fn from_config(
        http: &HttpConfig,
        agent: Arc<dyn InterceptorAgent>,
    ) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(http.timeout_secs);
        Ok(Self {
            direct: Arc::new(DirectBackend::new(timeout)?),
            proxy: Arc::new(ProxyBackend::new(http.proxy_url.clone(), timeout)?),
            extension: Arc::new(ExtensionBackend::new(agent)),
        })
    }

    /// Backend for a strategy
    #[must_use]
    pub fn for_strategy(&self, strategy: Strategy) -> &Arc<dyn HttpBackend> {
        match strategy {
            Strategy::Extension => &self.extension,
            Strategy::Proxy => &self.proxy,
            Strategy::Direct => &self.direct,
        }
    }
}

/// Fixed parameters of the write path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConfig {
    /// Gas attached to every function call
    pub gas: u64,
    /// Receiver used when the envelope names no account
    pub default_receiver: String,
}

impl From<&LedgerConfig> for WriteConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            gas: config.function_call_gas,
            default_receiver: config.contract_name.clone(),
        }
    }
}

#[derive(Clone)]
struct ArchivalRouting {
    heights: Arc<dyn BlockHeightSource>,
    router: BlockRouter,
    archival_url: String,
}

/// Executes effective requests
#[derive(Clone)]
pub struct RequestExecutor {
    selector: StrategySelector,
    backends: Backends,
    signer: Arc<dyn TransactionSigner>,
    write: WriteConfig,
    archival: Option<ArchivalRouting>,
}

impl RequestExecutor {
    /// Executor without archival routing of reads
    #[must_use]
    pub fn new(
        selector: StrategySelector,
        backends: Backends,
        signer: Arc<dyn TransactionSigner>,
        write: WriteConfig,
    ) -> Self {
        Self {
            selector,
            backends,
            signer,
            write,
            archival: None,
        }
    }

    /// Executor signing through a connection manager, with archival routing
    #[must_use]
    pub fn from_manager(
        manager: &Arc<ConnectionManager>,
        selector: StrategySelector,
        backends: Backends,
    ) -> Self {
        let config = manager.config();
        let archival_url = config.archival_node_url.clone();
        let write = WriteConfig::from(config);
        let router = manager.router();
        let signer: Arc<dyn TransactionSigner> = Arc::clone(manager) as Arc<dyn TransactionSigner>;
        let heights: Arc<dyn BlockHeightSource> = Arc::clone(manager) as Arc<dyn BlockHeightSource>;
        Self::new(selector, backends, signer, write).with_archival_routing(heights, router, archival_url)
    }

    /// Send reads pinned to old blocks to `archival_url`
    #[must_use]
    pub fn with_archival_routing(
        mut self,
        heights: Arc<dyn BlockHeightSource>,
        router: BlockRouter,
        archival_url: impl Into<String>,
    ) -> Self {
        self.archival = Some(ArchivalRouting {
            heights,
            router,
            archival_url: archival_url.into(),
        });
        self
    }

    /// Strategy selector
    #[must_use]
    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// Start an execution
    ///
    /// `Loading` is pushed before this returns; the terminal response follows
    /// from a spawned task. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn execute(&self, request: EffectiveRequest) -> ResponseStream {
        let (tx, rx) = mpsc::unbounded();
        let loading = RestResponse::Loading {
            req: request.request.clone(),
        };
        if tx.unbounded_send(loading).is_err() {
            return rx;
        }
        let executor = self.clone();
        tokio::spawn(async move {
            if let Some(terminal) = executor.run(request).await {
                if tx.unbounded_send(terminal).is_err() {
                    tracing::debug!("Response stream dropped before completion");
                }
            }
        });
        rx
    }

    /// Run an execution to its terminal response
    ///
    /// `None` when the execution was cancelled.
    pub async fn run(&self, request: EffectiveRequest) -> Option<RestResponse> {
        // The caller's snapshot is owned from here; later session edits cannot reach it
        let snapshot = request.request.clone();
        match self.try_run(&request).await {
            Ok(response) => Some(response),
            Err(e) if e.is_cancelled() => {
                tracing::warn!(endpoint = %snapshot.endpoint, "Execution cancelled");
                None
            }
            Err(e) => {
                tracing::warn!(endpoint = %snapshot.endpoint, error = %e, "Execution failed");
                Some(network_fail(&e, snapshot))
            }
        }
    }

    async fn try_run(&self, request: &EffectiveRequest) -> Result<RestResponse, ExecutionError> {
        let body = request
            .effective_final_body
            .text()
            .ok_or(TypesError::MissingEnvelope)?;
        let envelope = CallEnvelope::parse(body)?;

        let headers: IndexMap<String, String> = request
            .effective_final_headers
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect();
        let params: IndexMap<String, String> = request
            .effective_final_params
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect();

        let start = Instant::now();
        match envelope.request_type() {
            RequestType::CallFunction => {
                let url = self.read_url(&envelope, &request.effective_final_url);
                let http_request = HttpRequest {
                    method: request.request.method,
                    url: url.trim().to_string(),
                    headers,
                    params,
                    body: HttpRequest::body_from(&request.effective_final_body),
                };
                let strategy = self.selector.select();
                tracing::info!(strategy = %strategy, url = %http_request.url, "Dispatching read");
                let response = self.backends.for_strategy(strategy).send(http_request).await?;
                Ok(normalize_read(response, request.request.clone(), elapsed_ms(start)))
            }
            RequestType::WriteFunction => {
                let deposit = match request.request.auth.attached_amount() {
                    Some(amount) => parse_near_amount(amount)?,
                    None => 0,
                };
                let receiver_id = if envelope.params.account_id.is_empty() {
                    self.write.default_receiver.clone()
                } else {
                    envelope.params.account_id.clone()
                };
                let call = FunctionCallRequest {
                    receiver_id,
                    method_name: envelope.params.method_name.clone(),
                    args: params,
                    gas: self.write.gas,
                    deposit,
                };
                tracing::info!(
                    receiver = %call.receiver_id,
                    method = %call.method_name,
                    deposit = %call.deposit,
                    "Dispatching write"
                );
                let outcome = self.signer.function_call(call).await?;
                Ok(normalize_write(&outcome, request.request.clone(), elapsed_ms(start)))
            }
        }
    }

    /// Archival URL for reads pinned to a block older than the retention window
    fn read_url<'a>(&'a self, envelope: &CallEnvelope, url: &'a str) -> &'a str {
        let (Some(routing), Some(BlockId::Height(target))) =
            (&self.archival, &envelope.params.block_id)
        else {
            return url;
        };
        let observed = routing.heights.last_block_height();
        let route = routing.router.route(*target, observed);
        tracing::debug!(target, observed, route = route.as_str(), "Routing pinned read");
        match route {
            Route::Archival => &routing.archival_url,
            Route::Live => url,
        }
    }

    /// Abort the in-flight transport request
    ///
    /// Cancels the extension when it is the current strategy, otherwise the
    /// direct and proxy backends. Does nothing when no request is in flight.
    pub fn cancel_running_request(&self) {
        match self.selector.select() {
            Strategy::Extension => self.backends.extension.cancel(),
            Strategy::Proxy | Strategy::Direct => {
                self.backends.direct.cancel();
                self.backends.proxy.cancel();
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
