use super::{HttpBackend, InFlight};
use crate::error::TransportError;
use crate::http::{HttpBody, HttpRequest, HttpResponse};
use async_trait::async_trait;
use chainreq_types::HttpMethod;
use indexmap::IndexMap;
use std::time::Duration;

/// Outbound call straight from this process
#[derive(Debug)]
pub struct DirectBackend {
    client: reqwest::Client,
    in_flight: InFlight,
}

impl DirectBackend {
    /// Backend with a per-request timeout
    ///
    /// # Errors
    /// `TransportError::Http` if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Backend over an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            in_flight: InFlight::default(),
        }
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = to_reqwest_method(request.method);
        let mut builder = self
            .client
            .request(method, request.url.trim())
            .query(&request.params.iter().collect::<Vec<_>>());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder = match request.body {
            None => builder,
            Some(HttpBody::Text(text)) => builder.body(text),
            Some(HttpBody::Multipart(entries)) => {
                let form = entries
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, kv| {
                        form.text(kv.key, kv.value)
                    });
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let mut headers = IndexMap::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let data = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            data,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl HttpBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "Direct request");
        self.in_flight.run(self.dispatch(request)).await
    }

    fn cancel(&self) {
        if self.in_flight.cancel() {
            tracing::warn!("Direct request cancelled");
        }
    }
}
