//! Results of a test script run

use serde::{Deserialize, Serialize};

/// Outcome of one expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectStatus {
    /// Expectation held
    Pass,
    /// Expectation did not hold
    Fail,
    /// Expectation could not be evaluated
    Error,
}

/// One expectation and its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectResult {
    /// Outcome
    pub status: ExpectStatus,
    /// Message reported by the script
    pub message: String,
}

/// A test block with its expectations and nested blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Block description; empty for the root
    pub description: String,
    /// Expectations evaluated directly in this block
    pub expect_results: Vec<ExpectResult>,
    /// Nested blocks
    pub tests: Vec<TestResult>,
}

impl TestResult {
    /// Count of expectations with `status` in this block and every nested one
    #[must_use]
    pub fn count(&self, status: ExpectStatus) -> usize {
        self.expect_results
            .iter()
            .filter(|r| r.status == status)
            .count()
            + self.tests.iter().map(|t| t.count(status)).sum::<usize>()
    }

    /// Check if nothing failed or errored
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.count(ExpectStatus::Fail) == 0 && self.count(ExpectStatus::Error) == 0
    }
}
