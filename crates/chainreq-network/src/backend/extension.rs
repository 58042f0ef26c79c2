use super::{HttpBackend, InFlight};
use crate::error::TransportError;
use crate::http::{ForwardedRequest, ForwardedResponse, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Out-of-process agent that intercepts and sends requests
#[async_trait]
pub trait InterceptorAgent: Send + Sync {
    /// Check if the agent is present
    fn is_installed(&self) -> bool;

    /// Send a request through the agent
    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Abort the request the agent is running, if any
    fn cancel_request(&self);
}

/// [`HttpBackend`] that delegates to an [`InterceptorAgent`]
#[derive(Clone)]
pub struct ExtensionBackend {
    agent: Arc<dyn InterceptorAgent>,
}

impl ExtensionBackend {
    /// Backend over an agent
    #[must_use]
    pub fn new(agent: Arc<dyn InterceptorAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl HttpBackend for ExtensionBackend {
    fn name(&self) -> &'static str {
        "extension"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if !self.agent.is_installed() {
            return Err(TransportError::Extension("agent is not installed".into()));
        }
        self.agent.send_request(request).await
    }

    fn cancel(&self) {
        self.agent.cancel_request();
    }
}

/// Agent reachable over HTTP on the local machine
///
/// Installation is detected by [`LocalAgent::probe`]; until a probe succeeds the
/// agent reports itself as not installed.
#[derive(Debug)]
pub struct LocalAgent {
    agent_url: String,
    client: reqwest::Client,
    installed: AtomicBool,
    in_flight: InFlight,
}

impl LocalAgent {
    /// Agent at `agent_url`
    ///
    /// # Errors
    /// `TransportError::Http` if the HTTP client cannot be built
    pub fn new(agent_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            agent_url: agent_url.into().trim_end_matches('/').to_string(),
            client,
            installed: AtomicBool::new(false),
            in_flight: InFlight::default(),
        })
    }

    /// Check for the agent and remember the answer
    pub async fn probe(&self) -> bool {
        let url = format!("{}/status", self.agent_url);
        let installed = matches!(
            self.client.get(&url).send().await,
            Ok(response) if response.status().is_success()
        );
        self.installed.store(installed, Ordering::Release);
        tracing::info!(agent = %self.agent_url, installed, "Probed interceptor agent");
        installed
    }

    async fn forward(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply: ForwardedResponse = self
            .client
            .post(format!("{}/request", self.agent_url))
            .json(&ForwardedRequest::from(&request))
            .send()
            .await?
            .json()
            .await?;
        reply.into_response(TransportError::Extension)
    }
}

#[async_trait]
impl InterceptorAgent for LocalAgent {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(agent = %self.agent_url, url = %request.url, "Intercepted request");
        self.in_flight.run(self.forward(request)).await
    }

    fn cancel_request(&self) {
        if self.in_flight.cancel() {
            tracing::warn!("Intercepted request cancelled");
        }
    }
}
