//! Directory-backed stores: one file per key.
//!
//! Each file is named by the BLAKE3 hash of its key, so names have a fixed
//! length whatever the key holds. Key-value entries keep the original key in
//! a `.key` sidecar for listing. Writes land in a dot-prefixed temporary file
//! and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobStore, KvStore, StoredBlob};

const KEY_SUFFIX: &str = ".key";
const CONTENT_TYPE_SUFFIX: &str = ".type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 64 hex characters, independent of the key's length or contents.
fn file_name_for(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// `path` with `suffix` appended to its file name.
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

async fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidKey(path.display().to_string()))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_present(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Key-value namespace stored as one file per key under `root`.
#[derive(Debug, Clone)]
pub struct DirKvStore {
    root: PathBuf,
}

impl DirKvStore {
    /// Open (creating if needed) a namespace directory.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name_for(key))
    }
}

#[async_trait]
impl KvStore for DirKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        read_optional(&self.path_for(key)).await
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        let path = self.path_for(key);
        write_atomic(&sidecar(&path, KEY_SUFFIX), key.as_bytes()).await?;
        write_atomic(&path, value.as_bytes()).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key);
        let removed = remove_if_present(&path).await?;
        remove_if_present(&sidecar(&path, KEY_SUFFIX)).await?;
        Ok(removed)
    }

    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Value files only; temp files and sidecars carry a dot.
            if name.contains('.') {
                continue;
            }
            let Some(key) = read_optional(&sidecar(&entry.path(), KEY_SUFFIX)).await? else {
                tracing::debug!(file = name, "value file without key sidecar");
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Blob store keeping each blob's bytes in one file and its content type in
/// a `.type` sidecar.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn paths_for(&self, key: &str) -> (PathBuf, PathBuf) {
        let data = self.root.join(file_name_for(key));
        let content_type = sidecar(&data, CONTENT_TYPE_SUFFIX);
        (data, content_type)
    }
}

#[async_trait]
impl BlobStore for DirBlobStore {
    async fn put(&self, key: &str, blob: StoredBlob) -> StoreResult<()> {
        let (data_path, type_path) = self.paths_for(key);
        write_atomic(&type_path, blob.content_type.as_bytes()).await?;
        write_atomic(&data_path, &blob.data).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        let (data_path, type_path) = self.paths_for(key);
        let data = match fs::read(&data_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = read_optional(&type_path)
            .await?
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        Ok(Some(StoredBlob::new(data, content_type)))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let (data_path, type_path) = self.paths_for(key);
        remove_if_present(&type_path).await?;
        remove_if_present(&data_path).await
    }
}
