//! Domain records for the C-Terminal Community backend.
//!
//! Every record here is stored as a camelCase JSON document under a string
//! key in the key-value store. The types carry no storage logic; they only
//! know their own key layout and how to apply a partial update.
//!
//! # Key Types
//!
//! - [`User`] / [`Profile`]: account record and its optional profile
//! - [`Post`] / [`PostMeta`]: community posts and their index metadata
//! - [`Project`] / [`ProjectMeta`]: uploaded `.ctm` projects
//! - [`Comment`]: comments attached to a post
//! - [`Like`] / [`LikeTarget`]: presence-keyed like markers
//! - [`IndexEntry`]: metadata records kept in a denormalized index list

pub mod comment;
pub mod error;
pub mod id;
pub mod like;
pub mod meta;
pub mod post;
pub mod project;
pub mod user;

pub use comment::{Comment, CommentDraft};
pub use error::TypeError;
pub use id::{apply_delta, generate_id, Timestamp};
pub use like::{Like, LikeRequest, LikeTarget};
pub use meta::{IndexEntry, PostMeta, ProjectMeta, INDEX_KEY};
pub use post::{Post, PostDraft, PostPatch};
pub use project::{Project, ProjectPatch, CTM_EXTENSION};
pub use user::{Profile, User, UserInput, UserPatch, UserStats, PROFILE_KEY_PREFIX};
