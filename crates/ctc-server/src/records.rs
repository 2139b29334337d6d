//! Read-modify-write helpers for counters kept on stored records.

use serde::de::DeserializeOwned;
use serde::Serialize;

use ctc_store::{KvStore, KvStoreExt, StoreResult};

/// Load the record at `key`, let `edit` change it, and write it back.
///
/// Returns the updated record, or `None` when the key is absent (nothing is
/// written in that case).
pub async fn update_record<T, F>(store: &dyn KvStore, key: &str, edit: F) -> StoreResult<Option<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce(&mut T) + Send,
{
    let Some(mut record) = store.get_json::<T>(key).await? else {
        return Ok(None);
    };
    edit(&mut record);
    store.put_json(key, &record).await?;
    Ok(Some(record))
}

/// [`update_record`] for side counters whose failure must not fail the
/// request that triggered them: errors and missing targets are logged.
pub async fn update_record_logged<T, F>(store: &dyn KvStore, what: &str, key: &str, edit: F)
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce(&mut T) + Send,
{
    match update_record::<T, F>(store, key, edit).await {
        Ok(Some(_)) => {}
        Ok(None) => tracing::debug!(key, "{what} target not found, counter unchanged"),
        Err(e) => tracing::warn!(key, error = %e, "failed to update {what}"),
    }
}
