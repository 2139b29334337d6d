//! Lightweight metadata records kept in the per-resource index list.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::id::Timestamp;

/// Reserved key holding a namespace's index list.
pub const INDEX_KEY: &str = "__index__";

/// A record stored in a denormalized index list.
///
/// The list is rewritten as a whole on every mutation, so entries carry only
/// the fields listing and filtering need.
pub trait IndexEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn author_id(&self) -> &str;
    fn created_at(&self) -> Timestamp;
}

/// Index entry for a [`Post`](crate::Post).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub author_id: String,
    pub created_at: Timestamp,
}

impl IndexEntry for PostMeta {
    fn id(&self) -> &str {
        &self.id
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Index entry for a [`Project`](crate::Project).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    pub name: String,
    pub author_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}

impl ProjectMeta {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl IndexEntry for ProjectMeta {
    fn id(&self) -> &str {
        &self.id
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
