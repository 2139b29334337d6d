use serde::{Deserialize, Serialize};

use crate::id::Timestamp;

const BY_POST_PREFIX: &str = "by_post/";

/// A comment on a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub author_id: String,
    pub created_at: Timestamp,
}

impl Comment {
    /// Marker key listing this comment under its post.
    ///
    /// Markers share the comments namespace with the records, so listing a
    /// post's comments is a prefix scan rather than a full key-space scan.
    pub fn post_marker_key(post_id: &str, comment_id: &str) -> String {
        format!("{BY_POST_PREFIX}{post_id}/{comment_id}")
    }

    /// Prefix covering every marker of one post.
    pub fn post_marker_prefix(post_id: &str) -> String {
        format!("{BY_POST_PREFIX}{post_id}/")
    }

    pub fn is_marker_key(key: &str) -> bool {
        key.starts_with(BY_POST_PREFIX)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
