//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use smarthome_domain::error::{SmartHomeError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SmartHomeError`] and unreadable request bodies to an HTTP
/// response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(SmartHomeError),
    /// Body missing, not JSON, or not of the expected shape.
    MalformedBody(JsonRejection),
}

impl From<SmartHomeError> for ApiError {
    fn from(err: SmartHomeError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            Self::Domain(err) => err,
            Self::MalformedBody(rejection) => {
                tracing::debug!(status = %rejection.status(), "request body rejected");
                let body = ErrorBody {
                    error: rejection.body_text(),
                };
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
        };
        let (status, message) = match &err {
            SmartHomeError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SmartHomeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            SmartHomeError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            SmartHomeError::Storage(err) => {
                tracing::error!(error = ?err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
