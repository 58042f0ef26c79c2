//! Testing utilities for the chainreq workspace
//!
//! In-memory fakes for the ledger node, the signer, HTTP backends, the
//! interceptor agent and script evaluation, plus request fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chainreq_ledger::{
    BlockHeader, BlockReference, FunctionCallRequest, InMemoryKeyStore, KeyPair, KeyStore,
    LedgerError, LedgerProvider, QueryRequest, TransactionSigner,
};
use chainreq_network::{HttpBackend, HttpRequest, HttpResponse, InterceptorAgent, TransportError};
use chainreq_session::{ScriptError, ScriptRunner};
use chainreq_types::envelope::patch_params;
use chainreq_types::{
    BlockId, CallKind, CombinedEnv, EffectiveRequest, EnvVar, LedgerConfig, RestAuth, RestParam,
    RestReqBody, RestRequest, RestResponse, TestResult,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const TEST_NETWORK: &str = "testnet";
pub const TEST_ACCOUNT: &str = "alice.testnet";
pub const TEST_CONTRACT: &str = "posts.testnet";

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Call recorded by [`FakeLedgerProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Block(BlockReference),
    Query(QueryRequest),
    Broadcast(String),
}

/// What `broadcast_tx_commit` answers
#[derive(Debug, Clone)]
pub enum Outcome {
    Value(Value),
    Timeout,
    Rpc(String),
}

impl Outcome {
    fn into_result(self) -> Result<Value, LedgerError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Timeout => Err(LedgerError::Timeout("broadcast_tx_commit".into())),
            Self::Rpc(message) => Err(LedgerError::Rpc {
                code: -32000,
                message,
            }),
        }
    }
}

pub fn block_hash() -> String {
    bs58::encode([7u8; 32]).into_string()
}

pub fn success_outcome() -> Value {
    json!({
        "status": { "SuccessValue": "" },
        "transaction": { "hash": block_hash() },
    })
}

/// Ledger node held in memory
pub struct FakeLedgerProvider {
    url: String,
    height: AtomicU64,
    failing: AtomicBool,
    nonce: AtomicU64,
    view_result: Mutex<Vec<u8>>,
    outcome: Mutex<Outcome>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl FakeLedgerProvider {
    pub fn new(url: &str, height: u64) -> Self {
        Self {
            url: url.to_string(),
            height: AtomicU64::new(height),
            failing: AtomicBool::new(false),
            nonce: AtomicU64::new(10),
            view_result: Mutex::new(Vec::new()),
            outcome: Mutex::new(Outcome::Value(success_outcome())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(url: &str, height: u64) -> Arc<Self> {
        Arc::new(Self::new(url, height))
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    pub fn set_view_result(&self, value: &Value) {
        *self.view_result.lock() = serde_json::to_vec(value).unwrap();
    }

    pub fn set_view_bytes(&self, bytes: Vec<u8>) {
        *self.view_result.lock() = bytes;
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ProviderCall::Query(q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ProviderCall::Broadcast(tx) => Some(tx.clone()),
                _ => None,
            })
            .collect()
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(LedgerError::Transport(format!("{}: connection refused", self.url)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerProvider for FakeLedgerProvider {
    fn url(&self) -> &str {
        &self.url
    }

    async fn block(&self, reference: BlockReference) -> Result<BlockHeader, LedgerError> {
        self.calls.lock().push(ProviderCall::Block(reference.clone()));
        self.check()?;
        let height = match reference {
            BlockReference::BlockId(BlockId::Height(h)) => h,
            _ => self.height.load(Ordering::SeqCst),
        };
        Ok(BlockHeader {
            height,
            hash: block_hash(),
        })
    }

    async fn query(&self, request: QueryRequest) -> Result<Value, LedgerError> {
        self.calls.lock().push(ProviderCall::Query(request.clone()));
        self.check()?;
        let height = self.height.load(Ordering::SeqCst);
        Ok(match request {
            QueryRequest::CallFunction { .. } => json!({
                "result": self.view_result.lock().clone(),
                "logs": [],
                "block_height": height,
                "block_hash": block_hash(),
            }),
            QueryRequest::ViewAccessKey { .. } => json!({
                "nonce": self.nonce.load(Ordering::SeqCst),
                "permission": "FullAccess",
                "block_height": height,
                "block_hash": block_hash(),
            }),
        })
    }

    async fn broadcast_tx_commit(&self, signed_tx_base64: String) -> Result<Value, LedgerError> {
        self.calls
            .lock()
            .push(ProviderCall::Broadcast(signed_tx_base64));
        self.check()?;
        self.outcome.lock().clone().into_result()
    }
}

/// Key store holding one deterministic key for [`TEST_ACCOUNT`]
pub fn key_store_with_test_account() -> Arc<InMemoryKeyStore> {
    let store = InMemoryKeyStore::new();
    store
        .set_key(TEST_NETWORK, TEST_ACCOUNT, test_key_pair())
        .unwrap();
    Arc::new(store)
}

pub fn test_key_pair() -> KeyPair {
    KeyPair::from_seed(&[42u8; 32])
}

pub fn ledger_config(live_url: &str, archival_url: &str) -> LedgerConfig {
    LedgerConfig {
        network_id: TEST_NETWORK.to_string(),
        contract_name: TEST_CONTRACT.to_string(),
        ..LedgerConfig::default()
    }
    .with_node_url(live_url)
    .with_archival_node_url(archival_url)
    .with_account(TEST_ACCOUNT)
}

/// Signer recording every function call
pub struct FakeSigner {
    account_id: Option<String>,
    outcome: Mutex<Outcome>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<FunctionCallRequest>>,
}

impl FakeSigner {
    pub fn new(account_id: Option<&str>) -> Self {
        Self {
            account_id: account_id.map(str::to_string),
            outcome: Mutex::new(Outcome::Value(success_outcome())),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new(Some(TEST_ACCOUNT)))
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<FunctionCallRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TransactionSigner for FakeSigner {
    fn signer_account_id(&self) -> Option<String> {
        self.account_id.clone()
    }

    async fn function_call(&self, request: FunctionCallRequest) -> Result<Value, LedgerError> {
        self.calls.lock().push(request);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.account_id.is_none() {
            return Err(LedgerError::NotSignedIn);
        }
        self.outcome.lock().clone().into_result()
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Backend answering from memory
pub struct FakeHttpBackend {
    name: &'static str,
    reply: Mutex<Result<HttpResponse, TransportError>>,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
    cancelled: Notify,
    cancels: AtomicUsize,
}

impl FakeHttpBackend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            reply: Mutex::new(Ok(HttpResponse::new(200, b"{}".to_vec()))),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
            cancelled: Notify::new(),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn arc(name: &'static str) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn set_response(&self, response: HttpResponse) {
        *self.reply.lock() = Ok(response);
    }

    pub fn set_error(&self, error: TransportError) {
        *self.reply.lock() = Err(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpBackend for FakeHttpBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        let delay = *self.delay.lock();
        tokio::select! {
            () = self.cancelled.notified() => Err(TransportError::Cancelled),
            () = tokio::time::sleep(delay) => self.reply.lock().clone(),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.notify_waiters();
    }
}

/// Interceptor agent answering from memory
pub struct FakeAgent {
    installed: AtomicBool,
    backend: FakeHttpBackend,
}

impl FakeAgent {
    pub fn new(installed: bool) -> Self {
        Self {
            installed: AtomicBool::new(installed),
            backend: FakeHttpBackend::new("agent"),
        }
    }

    pub fn arc(installed: bool) -> Arc<Self> {
        Arc::new(Self::new(installed))
    }

    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    pub fn backend(&self) -> &FakeHttpBackend {
        &self.backend
    }
}

#[async_trait]
impl InterceptorAgent for FakeAgent {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.backend.send(request).await
    }

    fn cancel_request(&self) {
        self.backend.cancel();
    }
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// Script runner with scripted outcomes
#[derive(Default)]
pub struct FakeScriptRunner {
    pre_request_error: Mutex<Option<String>>,
    test_error: Mutex<Option<String>>,
    extra_env: Mutex<Vec<EnvVar>>,
    test_result: Mutex<TestResult>,
    test_runs: AtomicUsize,
}

impl FakeScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_pre_request(&self, message: &str) {
        *self.pre_request_error.lock() = Some(message.to_string());
    }

    pub fn fail_test(&self, message: &str) {
        *self.test_error.lock() = Some(message.to_string());
    }

    /// Variable the pre-request script "sets" in the selected environment
    pub fn set_env(&self, key: &str, value: &str) {
        self.extra_env.lock().push(EnvVar::new(key, value));
    }

    pub fn set_test_result(&self, result: TestResult) {
        *self.test_result.lock() = result;
    }

    pub fn test_runs(&self) -> usize {
        self.test_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptRunner for FakeScriptRunner {
    async fn run_pre_request(
        &self,
        _script: &str,
        mut env: CombinedEnv,
    ) -> Result<CombinedEnv, ScriptError> {
        if let Some(message) = self.pre_request_error.lock().clone() {
            return Err(ScriptError::PreRequest(message));
        }
        env.selected.extend(self.extra_env.lock().iter().cloned());
        Ok(env)
    }

    async fn run_test(
        &self,
        _script: &str,
        _response: &RestResponse,
    ) -> Result<TestResult, ScriptError> {
        self.test_runs.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.test_error.lock().clone() {
            return Err(ScriptError::Test(message));
        }
        Ok(self.test_result.lock().clone())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// View request against `url` with active params
pub fn view_request(url: &str, endpoint: &str, params: &[(&str, &str)]) -> RestRequest {
    let mut request = RestRequest {
        url: url.to_string(),
        endpoint: endpoint.to_string(),
        params: params.iter().map(|(k, v)| RestParam::new(*k, *v)).collect(),
        ..RestRequest::default()
    };
    request.sync_envelope();
    request
}

/// Write request to `receiver` signed by [`TEST_ACCOUNT`]
pub fn write_request(receiver: &str, endpoint: &str, amount: Option<&str>) -> RestRequest {
    let mut request = RestRequest {
        endpoint: endpoint.to_string(),
        call_kind: CallKind::NonPayable,
        auth: RestAuth::signed(TEST_ACCOUNT, amount.map(str::to_string)),
        params: vec![RestParam::new("text", "hello")],
        ..RestRequest::default()
    };
    request.sync_envelope();
    set_envelope_field(&mut request, "account_id", Value::from(receiver));
    request
}

/// Pin the envelope of a request to a block height
pub fn pin_to_block(request: &mut RestRequest, height: u64) {
    set_envelope_field(request, "block_id", Value::from(height));
    if let RestReqBody::Raw { body, .. } = &mut request.body {
        *body = patch_params(body, |params| {
            params.remove("finality");
        });
    }
}

fn set_envelope_field(request: &mut RestRequest, key: &str, value: Value) {
    if let RestReqBody::Raw { body, .. } = &mut request.body {
        *body = patch_params(body, |params| {
            params.insert(key.to_string(), value);
        });
    }
}

pub fn effective(request: &RestRequest) -> EffectiveRequest {
    EffectiveRequest::from_request(request)
}
