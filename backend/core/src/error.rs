use thiserror::Error;

/// Top-level error type for the tabsplit backend.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("service not configured: {0}")]
    NotConfigured(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SplitError {
    /// Short machine-readable code used in the HTTP error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            SplitError::Validation(_) => "INVALID_BODY",
            SplitError::NotFound(_) => "NOT_FOUND",
            SplitError::Provider { .. } => "PROVIDER_ERROR",
            SplitError::Timeout(_) => "SCAN_TIMEOUT",
            SplitError::NotConfigured(_) => "NOT_CONFIGURED",
            SplitError::RateLimited => "RATE_LIMITED",
            SplitError::Storage(_) => "PROVIDER_ERROR",
            SplitError::Other(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SplitError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(SplitError::RateLimited.code(), "RATE_LIMITED");
        assert_eq!(
            SplitError::Timeout("scan".into()).code(),
            "SCAN_TIMEOUT"
        );
    }
}
