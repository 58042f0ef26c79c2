//! Closed set of session transitions

use chainreq_types::{
    CallKind, ContentType, FormDataEntry, RestAuth, RestHeader, RestParam, RestReqBody,
    RestRequest, RestResponse, SaveContext, TestResult,
};

/// A named session transition and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Replace the whole request
    SetRequest(RestRequest),
    /// Rename the request
    SetRequestName(String),
    /// Change the target contract method
    SetEndpoint(String),
    /// Replace all params
    SetParams(Vec<RestParam>),
    /// Append a param
    AddParam(RestParam),
    /// Replace the param at `index`
    UpdateParam {
        /// Position in the param list
        index: usize,
        /// New param
        param: RestParam,
    },
    /// Remove the param at `index`
    DeleteParam(usize),
    /// Remove every param
    DeleteAllParams,
    /// Switch between view and write
    SetCallKind(CallKind),
    /// Replace all headers
    SetHeaders(Vec<RestHeader>),
    /// Append a header
    AddHeader(RestHeader),
    /// Replace the header at `index`
    UpdateHeader {
        /// Position in the header list
        index: usize,
        /// New header
        header: RestHeader,
    },
    /// Remove the header at `index`
    DeleteHeader(usize),
    /// Remove every header
    DeleteAllHeaders,
    /// Replace the auth descriptor
    SetAuth(RestAuth),
    /// Replace the pre-request script
    SetPreRequestScript(String),
    /// Replace the test script
    SetTestScript(String),
    /// Change the body content type, `None` for no body
    SetContentType(Option<ContentType>),
    /// Replace the body verbatim
    SetRequestBody(RestReqBody),
    /// Append a multipart entry
    AddFormDataEntry(FormDataEntry),
    /// Replace the multipart entry at `index`
    UpdateFormDataEntry {
        /// Position in the entry list
        index: usize,
        /// New entry
        entry: FormDataEntry,
    },
    /// Remove the multipart entry at `index`
    DeleteFormDataEntry(usize),
    /// Remove every multipart entry
    DeleteAllFormDataEntries,
    /// Replace the response slice
    UpdateResponse(Option<RestResponse>),
    /// Clear the response slice
    ClearResponse,
    /// Replace the test results slice
    SetTestResults(Option<TestResult>),
    /// Replace the save context slice
    SetSaveContext(Option<SaveContext>),
}

impl SessionAction {
    /// Transition name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetRequest(_) => "set_request",
            Self::SetRequestName(_) => "set_request_name",
            Self::SetEndpoint(_) => "set_endpoint",
            Self::SetParams(_) => "set_params",
            Self::AddParam(_) => "add_param",
            Self::UpdateParam { .. } => "update_param",
            Self::DeleteParam(_) => "delete_param",
            Self::DeleteAllParams => "delete_all_params",
            Self::SetCallKind(_) => "set_call_kind",
            Self::SetHeaders(_) => "set_headers",
            Self::AddHeader(_) => "add_header",
            Self::UpdateHeader { .. } => "update_header",
            Self::DeleteHeader(_) => "delete_header",
            Self::DeleteAllHeaders => "delete_all_headers",
            Self::SetAuth(_) => "set_auth",
            Self::SetPreRequestScript(_) => "set_pre_request_script",
            Self::SetTestScript(_) => "set_test_script",
            Self::SetContentType(_) => "set_content_type",
            Self::SetRequestBody(_) => "set_request_body",
            Self::AddFormDataEntry(_) => "add_form_data_entry",
            Self::UpdateFormDataEntry { .. } => "update_form_data_entry",
            Self::DeleteFormDataEntry(_) => "delete_form_data_entry",
            Self::DeleteAllFormDataEntries => "delete_all_form_data_entries",
            Self::UpdateResponse(_) => "update_response",
            Self::ClearResponse => "clear_response",
            Self::SetTestResults(_) => "set_test_results",
            Self::SetSaveContext(_) => "set_save_context",
        }
    }
}
