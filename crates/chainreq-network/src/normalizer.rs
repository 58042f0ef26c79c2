//! Response Normalizer
//!
//! Converts backend output into a [`RestResponse`].

use crate::error::ExecutionError;
use crate::http::HttpResponse;
use chainreq_types::{FailureDetail, ResponseHeader, ResponseMeta, RestRequest, RestResponse};
use serde_json::Value;

/// Status reported for an accepted transaction
pub const TRANSACTION_ACCEPTED_STATUS: u16 = 200;

/// Success for an HTTP-shaped read
///
/// Size comes from `content-length` when present and parseable, otherwise from
/// the body length.
#[must_use]
pub fn normalize_read(response: HttpResponse, req: RestRequest, duration_ms: u64) -> RestResponse {
    let response_size = response
        .content_length()
        .unwrap_or(response.data.len() as u64);
    RestResponse::Success {
        status_code: response.status,
        headers: response
            .headers
            .into_iter()
            .map(|(key, value)| ResponseHeader { key, value })
            .collect(),
        body: response.data,
        meta: ResponseMeta {
            response_size: Some(response_size),
            response_duration: duration_ms,
        },
        req,
    }
}

/// Success for a submitted transaction
///
/// The outcome is serialized as the body; there are no headers and no size.
#[must_use]
pub fn normalize_write(outcome: &Value, req: RestRequest, duration_ms: u64) -> RestResponse {
    RestResponse::Success {
        status_code: TRANSACTION_ACCEPTED_STATUS,
        body: serde_json::to_vec(outcome).unwrap_or_default(),
        headers: Vec::new(),
        meta: ResponseMeta {
            response_size: None,
            response_duration: duration_ms,
        },
        req,
    }
}

/// Failure response carrying the error detail
#[must_use]
pub fn network_fail(error: &ExecutionError, req: RestRequest) -> RestResponse {
    RestResponse::NetworkFail {
        error: FailureDetail::new(error.failure_kind(), error.to_string()),
        req,
    }
}
