//! Resource handlers. Each returns `ApiResult<Json<Value>>` (or a raw
//! response for downloads); errors render through [`ApiError`].
//!
//! [`ApiError`]: crate::error::ApiError

pub mod comments;
pub mod config;
pub mod likes;
pub mod posts;
pub mod projects;
pub mod users;

use serde_json::Value;

/// JSON body of a successful handler call.
pub type JsonValue = axum::Json<Value>;
