use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Environment variable that overrides [`ServerConfig::google_client_id`].
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Front-end bundle served for every non-API path.
    pub static_dir: PathBuf,
    /// OAuth client id handed to the browser by `GET /api/config`.
    pub google_client_id: String,
    /// Request body limit in bytes; bounds project uploads.
    pub max_upload_size: usize,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            static_dir: PathBuf::from("public"),
            google_client_id: String::new(),
            max_upload_size: 10 * 1024 * 1024,
            storage: StorageConfig::Memory,
        }
    }
}

/// Where records and uploaded files live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageConfig {
    /// Everything in memory; lost on restart.
    #[default]
    Memory,
    /// One file per key under `path`.
    Dir { path: PathBuf },
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from an optional TOML file, then apply environment overrides.
    ///
    /// A path that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml_str(&raw)?
            }
            Some(path) => {
                tracing::info!("config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(client_id) = std::env::var(GOOGLE_CLIENT_ID_ENV) {
            self.google_client_id = client_id;
        }
        self
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}
