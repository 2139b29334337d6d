//! Request extractors whose rejections render as `{"error": ...}` bodies.

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Query, Request};
use axum::http::request::Parts;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::auth::{Credentials, Identity};
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Rejects with 401 when the request carries no
/// bearer identity.
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_headers(&parts.headers);
        state
            .auth
            .authenticate(&credentials)
            .await?
            .map(Caller)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))
    }
}

/// JSON request body. Parsed regardless of `Content-Type`; a body that does
/// not decode is a 400.
#[derive(Clone, Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|_| ApiError::Validation("Invalid JSON".into()))
    }
}

/// `multipart/form-data` body. Any other content type is a 400.
#[derive(Debug)]
pub struct MultipartForm(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(MultipartForm)
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))
    }
}

/// Query string parameters; a malformed query is a 400.
#[derive(Clone, Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::try_from_uri(&parts.uri)
            .map(|Query(params)| QueryParams(params))
            .map_err(|e| ApiError::Validation(e.body_text()))
    }
}
