use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use ctc_store::StoreError;
use ctc_types::TypeError;

/// Failures while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A request failure, rendered as `{"error": message}` with a matching
/// status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: missing or invalid fields, malformed body.
    #[error("{0}")]
    Validation(String),

    /// 401: no usable bearer identity, or the identity does not match the
    /// user being modified.
    #[error("{0}")]
    Unauthorized(String),

    /// 403: authenticated but not the owner of the resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// 413: the body exceeds the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 500. The detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// Map an axum extractor rejection onto the error taxonomy: oversized
    /// bodies stay 413, everything else is a 400.
    pub fn from_rejection(status: StatusCode, text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(text)
        } else {
            Self::Validation(text)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TypeError> for ApiError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => tracing::error!(%detail, "request failed"),
            Self::Store(err) => tracing::error!(error = %err, "store access failed"),
            _ => {}
        }
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("Post").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = ApiError::from(StoreError::LockPoisoned("writer panicked".into()));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn type_errors_are_validation() {
        let err = ApiError::from(TypeError::MissingFields);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn rejections_keep_413_and_fold_the_rest_into_400() {
        let err = ApiError::from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".into());
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));
        let err = ApiError::from_rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad type".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "bad type");
    }

    #[tokio::test]
    async fn response_body_is_error_object() {
        let resp = ApiError::not_found("User").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "User not found" }));
    }
}
