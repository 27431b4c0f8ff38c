use serde::Serialize;

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestGenerationResult {
    /// The full text of the generated test. Never empty.
    Success { body: String },
    /// An expected, plugin-reported failure.
    Failure {
        reason: String,
        error_lines: Vec<String>,
    },
}

impl TestGenerationResult {
    pub fn success(body: impl Into<String>) -> Self {
        Self::Success { body: body.into() }
    }

    pub fn failure(reason: impl Into<String>, error_lines: Vec<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
            error_lines,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}
