use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::Timestamp;

/// What a like points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Post,
    Project,
}

impl LikeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LikeTarget {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "project" => Ok(Self::Project),
            other => Err(TypeError::InvalidLikeTarget(other.to_string())),
        }
    }
}

/// A like marker. The key alone carries the state: present means liked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: LikeTarget,
    pub created_at: Timestamp,
}

impl Like {
    /// Composite key `<type>_<targetId>_<userId>`.
    pub fn key(kind: LikeTarget, target_id: &str, user_id: &str) -> String {
        format!("{kind}_{target_id}_{user_id}")
    }
}

/// Body of a like toggle request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
}

impl LikeRequest {
    pub fn validate(self) -> Result<(LikeTarget, String), TypeError> {
        let kind = self.kind.ok_or(TypeError::MissingField("type"))?.parse()?;
        let target_id = self
            .target_id
            .filter(|t| !t.is_empty())
            .ok_or(TypeError::MissingField("targetId"))?;
        Ok((kind, target_id))
    }
}
