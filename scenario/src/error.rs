use thiserror::Error;

/// Failures of the scenario harness: malformed scenario files, engine
/// results that contradict an `expect` block, or post-state mismatches.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario JSON did not match the grammar.
    #[error("scenario parse error: {0}")]
    Parse(String),
    /// The scenario file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The scenario file is not valid JSON at all.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A transaction result or the post-state did not match expectations.
    #[error("check failed: {0}")]
    Check(String),
}

impl ScenarioError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        ScenarioError::Parse(message.into())
    }

    pub(crate) fn check(message: impl Into<String>) -> Self {
        ScenarioError::Check(message.into())
    }
}
