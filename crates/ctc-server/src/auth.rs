use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::{ApiError, ApiResult};

const BEARER_PREFIX: &str = "Bearer ";

/// The acting user for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The caller may only modify their own user records.
    pub fn require_self(&self, user_id: &str) -> ApiResult<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Unauthorized".into()))
        }
    }

    /// The caller must own the resource.
    pub fn require_owner(&self, owner_id: &str) -> ApiResult<()> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Forbidden".into()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read `Authorization: Bearer <token>`. Anything else, including an
    /// empty token, is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .filter(|token| !token.is_empty())
            .map(|token| Self::Bearer(token.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Turns request credentials into an [`Identity`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(None)` means the request carries no usable identity.
    async fn authenticate(&self, credentials: &Credentials) -> ApiResult<Option<Identity>>;
}

/// Trusts the bearer token as the caller's user id, with no signature check.
///
/// The front end sends its signed-in user id as the token. Anyone can claim
/// any id; swap in another [`AuthProvider`] for real verification.
pub struct TrustedBearerAuth;

#[async_trait]
impl AuthProvider for TrustedBearerAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ApiResult<Option<Identity>> {
        match credentials {
            Credentials::Bearer(token) => Ok(Some(Identity::new(token.clone()))),
            Credentials::Anonymous => Ok(None),
        }
    }
}
