//! Session state and the patches merged into it

use chainreq_types::{RestRequest, RestResponse, SaveContext, TestResult};
use serde::{Deserialize, Serialize};

/// The request being edited, its latest response and test results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Active request
    pub request: RestRequest,
    /// Latest response, if any
    pub response: Option<RestResponse>,
    /// Latest test results, if any
    pub test_results: Option<TestResult>,
    /// Where the request is saved, if it is
    pub save_context: Option<SaveContext>,
}

/// Partial update produced by a transition
///
/// `None` leaves a slice untouched; `Some(None)` clears an optional slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct SessionPatch {
    /// New request
    pub request: Option<RestRequest>,
    /// New response slice
    pub response: Option<Option<RestResponse>>,
    /// New test results slice
    pub test_results: Option<Option<TestResult>>,
    /// New save context slice
    pub save_context: Option<Option<SaveContext>>,
}

impl SessionPatch {
    /// Patch replacing the request
    #[must_use]
    pub fn request(request: RestRequest) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    /// Patch replacing the response slice
    #[must_use]
    pub fn response(response: Option<RestResponse>) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }

    /// Patch replacing the test results slice
    #[must_use]
    pub fn test_results(results: Option<TestResult>) -> Self {
        Self {
            test_results: Some(results),
            ..Self::default()
        }
    }

    /// Patch replacing the save context slice
    #[must_use]
    pub fn save_context(context: Option<SaveContext>) -> Self {
        Self {
            save_context: Some(context),
            ..Self::default()
        }
    }

    /// Check if the patch touches nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request.is_none()
            && self.response.is_none()
            && self.test_results.is_none()
            && self.save_context.is_none()
    }

    /// Merge into a session; returns whether any slice changed
    pub fn apply(self, session: &mut Session) -> bool {
        let mut changed = false;
        if let Some(request) = self.request {
            changed |= replace(&mut session.request, request);
        }
        if let Some(response) = self.response {
            changed |= replace(&mut session.response, response);
        }
        if let Some(results) = self.test_results {
            changed |= replace(&mut session.test_results, results);
        }
        if let Some(context) = self.save_context {
            changed |= replace(&mut session.save_context, context);
        }
        changed
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
