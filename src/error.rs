//! API error taxonomy and its HTTP mapping.
//!
//! Validation problems surface as 400, upstream timeouts as 504, upstream
//! rate limits as 429, everything else as 500. Filesystem and
//! malformed-payload failures never reach this type; they are recovered
//! inside their components.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::UpstreamError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        example: Option<serde_json::Value>,
    },

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Upstream rate limit exceeded, try again later")]
    UpstreamRateLimited,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            example: None,
        }
    }

    pub fn validation_with_example(
        message: impl Into<String>,
        example: serde_json::Value,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            example: Some(example),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout => Self::UpstreamTimeout,
            UpstreamError::RateLimited => Self::UpstreamRateLimited,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({ "error": self.to_string() });

        match &self {
            ApiError::Validation {
                example: Some(example),
                ..
            } => {
                body["example"] = example.clone();
            }
            ApiError::Internal(detail) => {
                log::error!("internal error: {detail}");
                if !development_mode() {
                    body["error"] = serde_json::Value::from("Internal server error");
                }
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Internal error detail is only echoed to clients when the process runs
/// with APP_ENV=development.
fn development_mode() -> bool {
    std::env::var("APP_ENV").is_ok_and(|env| env == "development")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(
            ApiError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::UpstreamRateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_errors_map_onto_api_errors() {
        assert!(matches!(
            ApiError::from(UpstreamError::Timeout),
            ApiError::UpstreamTimeout
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::RateLimited),
            ApiError::UpstreamRateLimited
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::Status(502)),
            ApiError::Internal(_)
        ));
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_detail_is_masked_outside_development() {
        // APP_ENV is not "development" in the test environment, so the
        // response body must carry the generic message, never the detail.
        let response = ApiError::internal("db connection string leaked").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("leaked"));
    }

    #[tokio::test]
    async fn validation_response_carries_the_example() {
        let response = ApiError::validation_with_example(
            "Missing required parameter: q",
            serde_json::json!("/api/search?q=funny+cats"),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing required parameter: q");
        assert_eq!(body["example"], "/api/search?q=funny+cats");
    }

    #[test]
    fn validation_error_keeps_its_example() {
        let err = ApiError::validation_with_example(
            "Missing required parameter: q",
            serde_json::json!("/api/search?q=funny+cats"),
        );
        let ApiError::Validation { example, .. } = &err else {
            panic!("expected a validation error");
        };
        assert_eq!(example.as_ref().unwrap(), "/api/search?q=funny+cats");
    }
}
