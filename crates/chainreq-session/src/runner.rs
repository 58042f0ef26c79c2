//! Request Runner
//!
//! Drives one execution end to end against the session:
//!
//! 1. pre-request script over the combined environment
//! 2. effective request resolved from the session's request
//! 3. executor stream pushed into the response slice
//! 4. test script over a success response, results into the test slice
//!
//! Starting a run makes every earlier run stale; a stale run's remaining
//! responses are discarded instead of reaching the store.

use crate::action::SessionAction;
use crate::error::ScriptError;
use crate::store::SessionStore;
use async_trait::async_trait;
use chainreq_network::RequestExecutor;
use chainreq_types::{CombinedEnv, EffectiveRequest, RestResponse, TestResult};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Black-box script evaluation
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run the pre-request script; returns the environment to resolve with
    async fn run_pre_request(
        &self,
        script: &str,
        env: CombinedEnv,
    ) -> Result<CombinedEnv, ScriptError>;

    /// Run the test script against a success response
    async fn run_test(&self, script: &str, response: &RestResponse)
        -> Result<TestResult, ScriptError>;
}

/// Runner that leaves the environment alone and reports no tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScriptRunner;

#[async_trait]
impl ScriptRunner for NoopScriptRunner {
    async fn run_pre_request(
        &self,
        _script: &str,
        env: CombinedEnv,
    ) -> Result<CombinedEnv, ScriptError> {
        Ok(env)
    }

    async fn run_test(
        &self,
        _script: &str,
        _response: &RestResponse,
    ) -> Result<TestResult, ScriptError> {
        Ok(TestResult::default())
    }
}

/// Runs the session's request through scripts and the executor
pub struct RequestRunner {
    store: Arc<SessionStore>,
    executor: RequestExecutor,
    scripts: Arc<dyn ScriptRunner>,
    generation: AtomicU64,
}

impl RequestRunner {
    /// Runner over a store, an executor and a script runner
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        executor: RequestExecutor,
        scripts: Arc<dyn ScriptRunner>,
    ) -> Self {
        Self {
            store,
            executor,
            scripts,
            generation: AtomicU64::new(0),
        }
    }

    /// Session store
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Run the current request
    ///
    /// Returns the terminal response written to the store, or `None` when the
    /// run was cancelled or superseded by a newer one.
    pub async fn run(&self, env: CombinedEnv) -> Option<RestResponse> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let request = self.store.value().request;

        let env = match self
            .scripts
            .run_pre_request(&request.pre_request_script, env)
            .await
        {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "Pre-request script failed");
                return self.fail(generation, &e);
            }
        };

        let effective = EffectiveRequest::resolve(&request, &env);
        let mut stream = self.executor.execute(effective);
        let mut terminal = None;
        while let Some(response) = stream.next().await {
            if !self.is_current(generation) {
                tracing::debug!(generation, "Discarding response of a superseded run");
                return None;
            }
            let is_terminal = response.is_terminal();
            self.store
                .dispatch(SessionAction::UpdateResponse(Some(response.clone())));
            if is_terminal {
                terminal = Some(response);
            }
        }
        let terminal = terminal?;

        if !terminal.is_success() {
            return Some(terminal);
        }
        match self.scripts.run_test(&request.test_script, &terminal).await {
            Ok(results) if self.is_current(generation) => {
                self.store
                    .dispatch(SessionAction::SetTestResults(Some(results)));
                Some(terminal)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Test script failed");
                self.fail(generation, &e)
            }
        }
    }

    /// Abort the in-flight transport request, if any
    pub fn cancel(&self) {
        self.executor.cancel_running_request();
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn fail(&self, generation: u64, error: &ScriptError) -> Option<RestResponse> {
        if !self.is_current(generation) {
            return None;
        }
        let response = RestResponse::ScriptFail {
            error: error.detail(),
        };
        self.store
            .dispatch(SessionAction::UpdateResponse(Some(response.clone())));
        Some(response)
    }
}
