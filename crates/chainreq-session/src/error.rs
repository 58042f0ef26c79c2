//! Script failures

use chainreq_types::{FailureDetail, FailureKind};
use std::fmt;

/// When a script ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptPhase {
    /// Before the request is resolved and sent
    PreRequest,
    /// Against the terminal response
    Test,
}

impl fmt::Display for ScriptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreRequest => "pre-request",
            Self::Test => "test",
        })
    }
}

/// A pre-request or test script raised an error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// Pre-request script failed; nothing was sent
    #[error("pre-request script failed: {0}")]
    PreRequest(String),

    /// Test script failed; the response is discarded
    #[error("test script failed: {0}")]
    Test(String),
}

impl ScriptError {
    /// Phase the script ran in
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ScriptPhase {
        match self {
            Self::PreRequest(_) => ScriptPhase::PreRequest,
            Self::Test(_) => ScriptPhase::Test,
        }
    }

    /// Detail carried by the `script_fail` response
    #[must_use]
    pub fn detail(&self) -> FailureDetail {
        FailureDetail::new(FailureKind::Script, self.to_string())
    }
}
