use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response shared by the API and the CLI.
/// Every error carries enough context for a client to correct the request
/// without reading server logs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "not_found")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Errors raised when parsing client-supplied labels into core types.
///
/// Detection and escalation themselves never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("unknown mood '{0}' (expected excellent, good, okay, low or struggling)")]
    UnknownMood(String),
    #[error("unknown check-in response '{0}' (expected better, same, worse or need_help)")]
    UnknownCheckInResponse(String),
    #[error("unknown keyword category '{0}'")]
    UnknownCategory(String),
}

impl CoreError {
    /// Name of the request field the bad value most likely came from.
    pub fn field(&self) -> &'static str {
        match self {
            CoreError::UnknownMood(_) => "mood",
            CoreError::UnknownCheckInResponse(_) => "response",
            CoreError::UnknownCategory(_) => "category",
        }
    }

    /// The offending value, as received.
    pub fn received(&self) -> &str {
        match self {
            CoreError::UnknownMood(v)
            | CoreError::UnknownCheckInResponse(v)
            | CoreError::UnknownCategory(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn core_error_exposes_field_and_value() {
        let err = CoreError::UnknownMood("meh".to_string());
        assert_eq!(err.field(), "mood");
        assert_eq!(err.received(), "meh");
        assert!(err.to_string().contains("'meh'"));
    }
}
