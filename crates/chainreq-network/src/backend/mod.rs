//! Interchangeable HTTP backends
//!
//! Every backend tracks its in-flight request so [`HttpBackend::cancel`] can
//! abort it. Cancelling with nothing in flight does nothing.

mod direct;
mod extension;
mod proxy;

pub use direct::DirectBackend;
pub use extension::{ExtensionBackend, InterceptorAgent, LocalAgent};
pub use proxy::ProxyBackend;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// One way of sending an HTTP-shaped request
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Send a request and wait for the response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Abort the in-flight request, if any
    fn cancel(&self);
}

/// Slot holding the cancellation token of the in-flight request
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    current: Mutex<Option<(u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl InFlight {
    /// Run `future` as the in-flight request
    ///
    /// A newer request replaces the slot; the older one keeps running but can
    /// no longer be cancelled through it.
    pub(crate) async fn run<F>(&self, future: F) -> Result<HttpResponse, TransportError>
    where
        F: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *self.current.lock() = Some((id, token.clone()));

        let result = tokio::select! {
            () = token.cancelled() => Err(TransportError::Cancelled),
            result = future => result,
        };

        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|(running, _)| *running == id) {
            *current = None;
        }
        result
    }

    /// Cancel the in-flight request; returns whether there was one
    pub(crate) fn cancel(&self) -> bool {
        match self.current.lock().take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
