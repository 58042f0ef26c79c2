//! Request execution for chainreq
//!
//! An [`EffectiveRequest`](chainreq_types::EffectiveRequest) is executed by the
//! [`RequestExecutor`]:
//!
//! - reads (`call_function`) go out as HTTP through the backend the
//!   [`StrategySelector`] picks: extension, proxy or direct
//! - writes (`write_function`) are signed and submitted through a
//!   [`TransactionSigner`](chainreq_ledger::TransactionSigner)
//!
//! Results are normalized into [`RestResponse`](chainreq_types::RestResponse)
//! values and delivered over a [`ResponseStream`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod error;
pub mod executor;
pub mod http;
pub mod normalizer;
pub mod strategy;

pub use backend::{
    DirectBackend, ExtensionBackend, HttpBackend, InterceptorAgent, LocalAgent, ProxyBackend,
};
pub use error::{ExecutionError, TransportError};
pub use executor::{Backends, RequestExecutor, ResponseStream, WriteConfig};
pub use http::{ForwardedRequest, ForwardedResponse, HttpBody, HttpRequest, HttpResponse};
pub use normalizer::{network_fail, normalize_read, normalize_write, TRANSACTION_ACCEPTED_STATUS};
pub use strategy::{SettingsHandle, Strategy, StrategySelector};
