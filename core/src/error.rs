use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response for clients of the coach API.
/// Carries enough information for a UI to render the failure and offer a retry.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "session_busy")
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
    pub const SESSION_BUSY: &str = "session_busy";
    pub const COLLABORATOR_UNAVAILABLE: &str = "collaborator_unavailable";
}

/// Why a rubric document could not be turned into a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("catalog document is not valid JSON or misses required keys: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("band id '{band_id}' is defined by both '{first}' and '{second}'")]
    DuplicateBand {
        band_id: String,
        first: String,
        second: String,
    },
}

/// Failure at the learner-profile persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile storage I/O failed at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("stored profile is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
