//! chainreq data model
//!
//! Value types shared by every layer of the client:
//! - [`RestRequest`] with its structured fields and the embedded [`CallEnvelope`]
//! - [`RestReqBody`] and the content types it can carry
//! - [`RestResponse`], the single discriminated outcome of an execution
//! - [`EffectiveRequest`], a request with templates and active entries resolved
//! - Test results, save contexts and collections
//! - [`ClientConfig`] for the ledger, HTTP and feature-flag settings
//!
//! # Example
//!
//! ```rust,ignore
//! use chainreq_types::{CallKind, RestParam, RestRequest};
//!
//! let mut req = RestRequest::default();
//! req.endpoint = "get_account".into();
//! req.call_kind = CallKind::View;
//! req.params.push(RestParam::new("account_id", "alice.testnet"));
//! req.sync_envelope();
//!
//! let envelope = req.envelope().unwrap();
//! assert_eq!(envelope.params.method_name, "get_account");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod body;
pub mod collection;
pub mod config;
pub mod effective;
pub mod envelope;
pub mod error;
pub mod request;
pub mod response;
pub mod save_context;
pub mod test_result;

pub use body::{ContentType, FormDataEntry, FormDataValue, RestReqBody};
pub use collection::{import_contract_abi, AbiInput, AbiMethod, Collection};
pub use config::{ClientConfig, HttpConfig, LedgerConfig, Settings};
pub use effective::{CombinedEnv, EffectiveBody, EffectiveRequest, EnvVar, KeyValue};
pub use envelope::{encode_args, BlockId, CallEnvelope, EnvelopeParams, Finality, RequestType};
pub use error::TypesError;
pub use request::{
    active_entries, AuthKind, CallKind, HttpMethod, RestAuth, RestHeader, RestParam, RestRequest,
    DEFAULT_RPC_URL, REST_REQ_SCHEMA_VERSION,
};
pub use response::{FailureDetail, FailureKind, ResponseHeader, ResponseMeta, RestResponse};
pub use save_context::SaveContext;
pub use test_result::{ExpectResult, ExpectStatus, TestResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
