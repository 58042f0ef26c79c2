//! Derived read-only views of the session

use crate::session::Session;
use crate::store::{Projection, SessionStore};
use chainreq_types::{
    CallEnvelope, CallKind, ContentType, RestAuth, RestHeader, RestParam, RestReqBody,
    RestResponse, SaveContext, TestResult,
};

/// Method name carried by the envelope, else the structured endpoint
#[must_use]
pub fn endpoint(session: &Session) -> String {
    request_endpoint(&endpoint_source(session))
}

/// Call kind carried by the envelope
///
/// Both write kinds read back as `NonPayable`; `None` without an envelope.
#[must_use]
pub fn call_kind(session: &Session) -> Option<CallKind> {
    request_call_kind(&session.request.body)
}

fn body_envelope(body: &RestReqBody) -> Option<CallEnvelope> {
    match body {
        RestReqBody::Raw { content_type, body } if content_type.is_json() => {
            CallEnvelope::parse(body).ok()
        }
        _ => None,
    }
}

fn endpoint_source(session: &Session) -> (RestReqBody, String) {
    (session.request.body.clone(), session.request.endpoint.clone())
}

fn request_endpoint((body, endpoint): &(RestReqBody, String)) -> String {
    body_envelope(body).map_or_else(|| endpoint.clone(), |envelope| envelope.params.method_name)
}

fn request_call_kind(body: &RestReqBody) -> Option<CallKind> {
    body_envelope(body).map(|envelope| CallKind::from_request_type(envelope.params.request_type))
}

/// Entries that are active and not entirely blank
#[must_use]
pub fn active_count<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, bool)>) -> usize {
    entries
        .into_iter()
        .filter(|(key, value, active)| *active && !(key.is_empty() && value.is_empty()))
        .count()
}

#[allow(clippy::ptr_arg)]
fn count_params(params: &Vec<RestParam>) -> usize {
    active_count(params.iter().map(|p| (p.key.as_str(), p.value.as_str(), p.active)))
}

#[allow(clippy::ptr_arg)]
fn count_headers(headers: &Vec<RestHeader>) -> usize {
    active_count(headers.iter().map(|h| (h.key.as_str(), h.value.as_str(), h.active)))
}

/// Response only when it is a success
#[must_use]
pub fn completed_response(session: &Session) -> Option<RestResponse> {
    session.response.clone().filter(RestResponse::is_success)
}

/// Every derived view, attached to one store
#[derive(Debug, Clone)]
pub struct SessionProjections {
    /// Request name
    pub request_name: Projection<String>,
    /// Target method name
    pub endpoint: Projection<String>,
    /// View or write
    pub call_kind: Projection<Option<CallKind>>,
    /// Params
    pub params: Projection<Vec<RestParam>>,
    /// Active, non-blank params
    pub active_params_count: Projection<usize>,
    /// Headers
    pub headers: Projection<Vec<RestHeader>>,
    /// Active, non-blank headers
    pub active_headers_count: Projection<usize>,
    /// Auth descriptor
    pub auth: Projection<RestAuth>,
    /// Body content type
    pub content_type: Projection<Option<ContentType>>,
    /// Body
    pub body: Projection<RestReqBody>,
    /// Pre-request script
    pub pre_request_script: Projection<String>,
    /// Test script
    pub test_script: Projection<String>,
    /// Response slice
    pub response: Projection<Option<RestResponse>>,
    /// Latest success response
    pub completed_response: Projection<Option<RestResponse>>,
    /// Test results slice
    pub test_results: Projection<Option<TestResult>>,
    /// Save context slice
    pub save_context: Projection<Option<SaveContext>>,
}

impl SessionProjections {
    /// Register every projection on `store`
    #[must_use]
    pub fn attach(store: &SessionStore) -> Self {
        Self {
            request_name: store.select(|s| s.request.name.clone()),
            endpoint: store.select_map(endpoint_source, request_endpoint),
            call_kind: store.select_map(|s| s.request.body.clone(), request_call_kind),
            params: store.select(|s| s.request.params.clone()),
            active_params_count: store.select_map(|s| s.request.params.clone(), count_params),
            headers: store.select(|s| s.request.headers.clone()),
            active_headers_count: store.select_map(|s| s.request.headers.clone(), count_headers),
            auth: store.select(|s| s.request.auth.clone()),
            content_type: store.select(|s| s.request.body.content_type()),
            body: store.select(|s| s.request.body.clone()),
            pre_request_script: store.select(|s| s.request.pre_request_script.clone()),
            test_script: store.select(|s| s.request.test_script.clone()),
            response: store.select(|s| s.response.clone()),
            completed_response: store.select_some(completed_response),
            test_results: store.select(|s| s.test_results.clone()),
            save_context: store.select(|s| s.save_context.clone()),
        }
    }
}
