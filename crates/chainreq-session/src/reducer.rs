//! Pure reduction of session transitions
//!
//! [`reduce`] maps the current session and one [`SessionAction`] to a
//! [`SessionPatch`]. It performs no I/O and never fails; out-of-range indices
//! leave the lists unchanged and multipart edits on a non-multipart body
//! produce an empty patch.
//!
//! Every transition that touches a structured request field (endpoint,
//! params, call kind, auth, content type) re-derives the embedded call
//! envelope before the patch is returned.

use crate::action::SessionAction;
use crate::body_transition::apply_body_transition;
use crate::session::{Session, SessionPatch};
use chainreq_types::{FormDataEntry, HttpMethod, RestReqBody, RestRequest};

/// Patch produced by `action` on `session`
#[must_use]
pub fn reduce(session: &Session, action: SessionAction) -> SessionPatch {
    let current = &session.request;
    match action {
        SessionAction::SetRequest(request) => SessionPatch::request(request),
        SessionAction::SetRequestName(name) => edit(current, |r| r.name = name),
        SessionAction::SetEndpoint(endpoint) => synced(current, |r| r.endpoint = endpoint),

        SessionAction::SetParams(params) => synced(current, |r| r.params = params),
        SessionAction::AddParam(param) => synced(current, |r| r.params.push(param)),
        SessionAction::UpdateParam { index, param } => {
            synced(current, |r| replace_at(&mut r.params, index, param))
        }
        SessionAction::DeleteParam(index) => synced(current, |r| remove_at(&mut r.params, index)),
        SessionAction::DeleteAllParams => synced(current, |r| r.params.clear()),

        SessionAction::SetCallKind(kind) => synced(current, |r| {
            r.call_kind = kind;
            r.method = HttpMethod::Post;
        }),

        SessionAction::SetHeaders(headers) => edit(current, |r| r.headers = headers),
        SessionAction::AddHeader(header) => edit(current, |r| r.headers.push(header)),
        SessionAction::UpdateHeader { index, header } => {
            edit(current, |r| replace_at(&mut r.headers, index, header))
        }
        SessionAction::DeleteHeader(index) => edit(current, |r| remove_at(&mut r.headers, index)),
        SessionAction::DeleteAllHeaders => edit(current, |r| r.headers.clear()),

        SessionAction::SetAuth(auth) => synced(current, |r| r.auth = auth),
        SessionAction::SetPreRequestScript(script) => {
            edit(current, |r| r.pre_request_script = script)
        }
        SessionAction::SetTestScript(script) => edit(current, |r| r.test_script = script),

        SessionAction::SetContentType(target) => synced(current, |r| {
            r.body = apply_body_transition(&r.body, target);
        }),
        SessionAction::SetRequestBody(body) => edit(current, |r| r.body = body),

        SessionAction::AddFormDataEntry(entry) => edit_form_data(current, |e| e.push(entry)),
        SessionAction::UpdateFormDataEntry { index, entry } => {
            edit_form_data(current, |e| replace_at(e, index, entry))
        }
        SessionAction::DeleteFormDataEntry(index) => {
            edit_form_data(current, |e| remove_at(e, index))
        }
        SessionAction::DeleteAllFormDataEntries => edit_form_data(current, Vec::clear),

        SessionAction::UpdateResponse(response) => SessionPatch::response(response),
        SessionAction::ClearResponse => SessionPatch::response(None),
        SessionAction::SetTestResults(results) => SessionPatch::test_results(results),
        SessionAction::SetSaveContext(context) => SessionPatch::save_context(context),
    }
}

fn edit(current: &RestRequest, f: impl FnOnce(&mut RestRequest)) -> SessionPatch {
    let mut request = current.clone();
    f(&mut request);
    SessionPatch::request(request)
}

fn synced(current: &RestRequest, f: impl FnOnce(&mut RestRequest)) -> SessionPatch {
    edit(current, |request| {
        f(request);
        request.sync_envelope();
    })
}

fn edit_form_data(current: &RestRequest, f: impl FnOnce(&mut Vec<FormDataEntry>)) -> SessionPatch {
    if !matches!(current.body, RestReqBody::Multipart { .. }) {
        return SessionPatch::default();
    }
    edit(current, |request| {
        if let RestReqBody::Multipart { entries } = &mut request.body {
            f(entries);
        }
    })
}

fn replace_at<T>(items: &mut [T], index: usize, value: T) {
    if let Some(slot) = items.get_mut(index) {
        *slot = value;
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) {
    if index < items.len() {
        items.remove(index);
    }
}
