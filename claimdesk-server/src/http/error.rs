//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use claimdesk_core::{BackendError, DeskError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No valid session (401)
    Unauthorized,

    /// Table name not managed here (404)
    UnknownTable { name: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Backend call failed (502, logged)
    Backend(BackendError),

    /// Internal error (500)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "unauthorized",
                    "message": "sign in required"
                }),
            ),
            Self::UnknownTable { name } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("table '{}' not found", name)
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Backend(e) => {
                tracing::error!("Backend error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "backend_error",
                        "message": e.to_string()
                    }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<DeskError> for ApiError {
    fn from(e: DeskError) -> Self {
        match e {
            DeskError::UnknownTable { name } => Self::UnknownTable { name },
            DeskError::RowOutOfRange { index, .. } => Self::NotFound {
                resource: "row",
                id: index.to_string(),
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unauthorized_is_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_table_is_404() {
        let err: ApiError = DeskError::unknown_table("invoices").into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn row_out_of_range_is_404() {
        let err: ApiError = DeskError::RowOutOfRange {
            table: "claims".into(),
            index: 9,
            len: 1,
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn backend_error_is_502() {
        let err = ApiError::from(BackendError::status(500, "boom"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
