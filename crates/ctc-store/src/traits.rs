use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// String-keyed, string-valued store for one namespace.
///
/// All implementations must satisfy these invariants:
/// - `get` after a successful `put` returns the written value.
/// - `delete` reports whether the key existed.
/// - `list_keys` returns matching keys in ascending order.
/// - No operation is atomic with respect to another.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create or overwrite a value.
    async fn put(&self, key: &str, value: String) -> StoreResult<()>;

    /// Delete a key. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// List every key starting with `prefix`, sorted. Pass `""` for all keys.
    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Check whether a key is present.
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// JSON helpers over any [`KvStore`].
#[async_trait]
pub trait KvStoreExt: KvStore {
    /// Read and decode a JSON record.
    async fn get_json<T>(&self, key: &str) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Encode and write a JSON record.
    async fn put_json<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw =
            serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put(key, raw).await
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// An uploaded file and the content type it was stored with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

impl StoredBlob {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Binary object store for uploaded project files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create or overwrite a blob.
    async fn put(&self, key: &str, blob: StoredBlob) -> StoreResult<()>;

    /// Read a blob. Returns `Ok(None)` if absent.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>>;

    /// Delete a blob. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;
}
