use super::{HttpBackend, InFlight};
use crate::error::TransportError;
use crate::http::{ForwardedRequest, ForwardedResponse, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Call forwarded through a remote proxy
///
/// The proxy takes a JSON description of the call and answers with the target's
/// status, headers and a base64 body.
#[derive(Debug)]
pub struct ProxyBackend {
    proxy_url: String,
    client: reqwest::Client,
    in_flight: InFlight,
}

impl ProxyBackend {
    /// Backend forwarding to `proxy_url`
    ///
    /// # Errors
    /// `TransportError::Http` if the HTTP client cannot be built
    pub fn new(proxy_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            proxy_url: proxy_url.into(),
            client,
            in_flight: InFlight::default(),
        })
    }

    /// Proxy URL
    #[must_use]
    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    async fn forward(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply: ForwardedResponse = self
            .client
            .post(&self.proxy_url)
            .json(&ForwardedRequest::from(&request))
            .send()
            .await?
            .json()
            .await?;
        reply.into_response(TransportError::Proxy)
    }
}

#[async_trait]
impl HttpBackend for ProxyBackend {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(proxy = %self.proxy_url, url = %request.url, "Proxied request");
        self.in_flight.run(self.forward(request)).await
    }

    fn cancel(&self) {
        if self.in_flight.cancel() {
            tracing::warn!("Proxied request cancelled");
        }
    }
}
