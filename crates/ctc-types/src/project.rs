use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::Timestamp;
use crate::meta::ProjectMeta;

/// The only upload extension accepted for projects.
pub const CTM_EXTENSION: &str = ".ctm";

/// An uploaded project. The file itself lives in the blob store under
/// `file_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub author_id: String,
    pub file_name: String,
    pub file_key: String,
    pub file_size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub likes: u64,
}

impl Project {
    /// Blob key for an uploaded file: `projects/<id>/<file name>`.
    pub fn file_key(project_id: &str, file_name: &str) -> String {
        format!("projects/{project_id}/{file_name}")
    }

    pub fn is_ctm_file(file_name: &str) -> bool {
        file_name.ends_with(CTM_EXTENSION)
    }

    /// Decode the multipart `tags` field: a JSON array of strings, where an
    /// absent or blank field means no tags.
    pub fn parse_tags(raw: Option<&str>) -> Result<Vec<String>, TypeError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str(raw).map_err(|e| TypeError::InvalidTags(e.to_string()))
            }
        }
    }

    pub fn apply(&mut self, patch: ProjectPatch, now: Timestamp) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }

    pub fn meta(&self) -> ProjectMeta {
        ProjectMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            author_id: self.author_id.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
