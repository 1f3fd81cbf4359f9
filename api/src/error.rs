use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eai_core::error::{self, ApiError};
use eai_runtime::SessionError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Unknown session or resource (404)
    NotFound { resource: &'static str, id: String },
    /// Another request for the same session is still in flight (409)
    SessionBusy,
    /// The generative backend failed or could not be reached (502)
    CollaboratorUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} '{id}' does not exist"),
                    field: None,
                    received: Some(serde_json::Value::String(id)),
                    request_id,
                    docs_hint: Some("Create a session with POST /v1/sessions first.".to_string()),
                },
            ),
            AppError::SessionBusy => (
                StatusCode::CONFLICT,
                ApiError {
                    error: error::codes::SESSION_BUSY.to_string(),
                    message: "A request for this session is still in flight".to_string(),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: Some(
                        "Wait for the pending turn to finish, then retry.".to_string(),
                    ),
                },
            ),
            AppError::CollaboratorUnavailable(reason) => {
                tracing::error!(%reason, "collaborator unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        error: error::codes::COLLABORATOR_UNAVAILABLE.to_string(),
                        message: reason,
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: Some(
                            "The session state is unchanged; send the message again to retry."
                                .to_string(),
                        ),
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Busy => AppError::SessionBusy,
            SessionError::EmptyMessage => AppError::Validation {
                message: err.to_string(),
                field: Some("message".to_string()),
                received: None,
                docs_hint: None,
            },
            SessionError::Collaborator(e) => AppError::CollaboratorUnavailable(e.to_string()),
        }
    }
}
