use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::Timestamp;

/// Key prefix for profile records stored alongside users.
pub const PROFILE_KEY_PREFIX: &str = "profile_";

/// A community member. The id is supplied by the client (the sign-in
/// subject) and doubles as the store key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Apply a partial update, stamping `updated_at`.
    pub fn apply(&mut self, patch: UserPatch, now: Timestamp) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(picture) = patch.picture {
            self.picture = Some(picture);
        }
        self.updated_at = now;
    }
}

/// Body of a create-or-update user request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl UserInput {
    /// Validate the required fields and build the record.
    ///
    /// `created_at` comes from the stored record when one exists, so the
    /// first-write timestamp survives later upserts.
    pub fn into_user(self, created_at: Option<Timestamp>, now: Timestamp) -> Result<User, TypeError> {
        let (Some(id), Some(email), Some(name)) = (
            non_empty(self.id),
            non_empty(self.email),
            non_empty(self.name),
        ) else {
            return Err(TypeError::MissingFields);
        };
        Ok(User {
            id,
            email,
            name,
            picture: self.picture,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Optional public profile, stored under [`Profile::key`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Profile {
    pub fn key(user_id: &str) -> String {
        format!("{PROFILE_KEY_PREFIX}{user_id}")
    }

    pub fn is_profile_key(key: &str) -> bool {
        key.starts_with(PROFILE_KEY_PREFIX)
    }
}

/// Per-user counters computed on demand from the post and project indexes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub posts_count: usize,
    pub projects_count: usize,
    pub likes_received: u64,
}
