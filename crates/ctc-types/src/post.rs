use serde::{Deserialize, Serialize};

use crate::id::Timestamp;
use crate::meta::PostMeta;

/// A community post.
///
/// Title, content and category are not validated on create: a post may be
/// stored with any of them absent, and absent fields are omitted from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub author_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}

impl Post {
    pub fn new(id: String, author_id: String, draft: PostDraft, now: Timestamp) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            category: draft.category,
            author_id,
            created_at: now,
            updated_at: now,
            likes: 0,
            comments: 0,
        }
    }

    pub fn apply(&mut self, patch: PostPatch, now: Timestamp) {
        if patch.title.is_some() {
            self.title = patch.title;
        }
        if patch.content.is_some() {
            self.content = patch.content;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        self.updated_at = now;
    }

    pub fn meta(&self) -> PostMeta {
        PostMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            author_id: self.author_id.clone(),
            created_at: self.created_at,
        }
    }
}

/// Body of a create-post request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Body of an update-post request; absent fields are left unchanged.
pub type PostPatch = PostDraft;
