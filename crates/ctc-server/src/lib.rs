//! HTTP server for the C-Terminal Community.
//!
//! Serves the JSON API for users, profiles, posts, projects, comments and
//! likes under `/api`, backed by the key-value and blob stores from
//! `ctc-store`, and the browser bundle for every other path.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod index;
pub mod records;
pub mod router;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use auth::{AuthProvider, Credentials, Identity, TrustedBearerAuth};
pub use config::{ServerConfig, StorageConfig, GOOGLE_CLIENT_ID_ENV};
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use index::{IndexMaintainer, Page, DEFAULT_PAGE_LIMIT};
pub use router::build_router;
pub use server::CtcServer;
pub use state::AppState;
