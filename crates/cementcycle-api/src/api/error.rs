//! Handler failures and their HTTP mapping

use crate::api::models::ErrorResponse;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cementcycle_core::ScoringError;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const SUPPORT_FALLBACK: &str =
    "Please try again shortly, or contact support@cementcycle.in for help from our team.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, example: JsonValue },

    #[error("{0}")]
    NotFound(String),

    /// A collaborator (store or model provider) failed. `cause` is logged, never returned.
    #[error("{message}")]
    Upstream { message: String, cause: anyhow::Error },
}

impl ApiError {
    pub fn validation(message: impl Into<String>, example: JsonValue) -> Self {
        Self::Validation {
            message: message.into(),
            example,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Upstream {
            message: message.into(),
            cause: cause.into(),
        }
    }

    /// Storage failures surface as a generic outage
    pub fn storage(cause: anyhow::Error) -> Self {
        Self::upstream("The marketplace database is temporarily unavailable", cause)
    }

    pub fn bad_body(rejection: JsonRejection, example: JsonValue) -> Self {
        Self::validation(format!("Invalid request body: {}", rejection.body_text()), example)
    }

    pub fn scoring(err: ScoringError, example: JsonValue) -> Self {
        Self::validation(err.to_string(), example)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { message, example } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("validation_error", message).with_example(example)),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("not_found", message)),
            )
                .into_response(),
            ApiError::Upstream { message, cause } => {
                tracing::error!(error = ?cause, "{}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(
                        ErrorResponse::new("service_unavailable", message)
                            .with_fallback(SUPPORT_FALLBACK),
                    ),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> JsonValue {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_includes_example() {
        let response =
            ApiError::validation("waste_type is required", serde_json::json!({"x": 1})).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["example"]["x"], 1);
    }

    #[tokio::test]
    async fn test_upstream_hides_cause() {
        let response =
            ApiError::upstream("Assistant unavailable", anyhow::anyhow!("api key sk-123 rejected"))
                .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"], "service_unavailable");
        assert_eq!(body["fallback"], SUPPORT_FALLBACK);
        assert!(!body.to_string().contains("sk-123"));
    }

    #[test]
    fn test_scoring_error_is_validation() {
        let err = ApiError::scoring(
            ScoringError::UnknownLocation {
                name: "Atlantis".into(),
                known: "Mumbai".into(),
            },
            JsonValue::Null,
        );
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(err.to_string().contains("Atlantis"));
    }
}
