//! Denormalized index lists and the listing contract built on them.
//!
//! Each listable namespace keeps every live record's metadata in one JSON
//! array under [`INDEX_KEY`]. Every mutation reads the whole array, edits it,
//! and writes it back. There is no locking or compare-and-set around that
//! read-modify-write: two concurrent writers to the same namespace can lose
//! an update. Callers treat index writes as best-effort (see the `*_logged`
//! methods), so a core record write reports success even when its index
//! entry failed.

use std::marker::PhantomData;

use futures::future::try_join_all;
use serde::de::DeserializeOwned;

use ctc_store::{KvStore, KvStoreExt, Namespace, StoreResult};
use ctc_types::{IndexEntry, INDEX_KEY};

/// Page size when a list request gives no `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Reads and rewrites one namespace's index list.
pub struct IndexMaintainer<'a, M> {
    store: &'a dyn KvStore,
    namespace: Namespace,
    _entry: PhantomData<M>,
}

impl<'a, M: IndexEntry> IndexMaintainer<'a, M> {
    pub fn new(store: &'a dyn KvStore, namespace: Namespace) -> Self {
        Self {
            store,
            namespace,
            _entry: PhantomData,
        }
    }

    /// The current list, in append order. An absent key is an empty list.
    pub async fn entries(&self) -> StoreResult<Vec<M>> {
        Ok(self
            .store
            .get_json::<Vec<M>>(INDEX_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn write(&self, entries: &[M]) -> StoreResult<()> {
        self.store.put_json(INDEX_KEY, entries).await
    }

    pub async fn append(&self, entry: &M) -> StoreResult<()> {
        let mut entries = self.entries().await?;
        entries.push(entry.clone());
        self.write(&entries).await
    }

    /// Drop every entry with `id`. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut entries = self.entries().await?;
        let before = entries.len();
        entries.retain(|e| e.id() != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries).await?;
        Ok(true)
    }

    /// Swap the entry with the same id in place, appending when absent.
    pub async fn replace(&self, entry: &M) -> StoreResult<()> {
        let mut entries = self.entries().await?;
        match entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(slot) => *slot = entry.clone(),
            None => entries.push(entry.clone()),
        }
        self.write(&entries).await
    }

    pub async fn append_logged(&self, entry: &M) {
        if let Err(e) = self.append(entry).await {
            tracing::warn!(namespace = %self.namespace, id = entry.id(), error = %e, "failed to append index entry");
        }
    }

    pub async fn remove_logged(&self, id: &str) {
        if let Err(e) = self.remove(id).await {
            tracing::warn!(namespace = %self.namespace, id, error = %e, "failed to remove index entry");
        }
    }

    pub async fn replace_logged(&self, entry: &M) {
        if let Err(e) = self.replace(entry).await {
            tracing::warn!(namespace = %self.namespace, id = entry.id(), error = %e, "failed to update index entry");
        }
    }
}

/// One page of index entries plus the post-filter total.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<M> {
    pub entries: Vec<M>,
    pub total: usize,
    pub has_more: bool,
}

/// Resolve optional `offset`/`limit` query values.
pub fn page_bounds(offset: Option<usize>, limit: Option<usize>) -> (usize, usize) {
    (offset.unwrap_or(0), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
}

/// Sort newest first and cut one page.
///
/// Entries with equal timestamps keep the most recently appended first.
pub fn paginate<M: IndexEntry>(mut entries: Vec<M>, offset: usize, limit: usize) -> Page<M> {
    entries.reverse();
    entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    let total = entries.len();
    let has_more = offset.saturating_add(limit) < total;
    let entries = entries.into_iter().skip(offset).take(limit).collect();
    Page {
        entries,
        total,
        has_more,
    }
}

/// Fetch the full records behind a page concurrently. Records that have
/// vanished since the index was read are skipped.
pub async fn fetch_records<M, T>(store: &dyn KvStore, entries: &[M]) -> StoreResult<Vec<T>>
where
    M: IndexEntry,
    T: DeserializeOwned + Send,
{
    let records = try_join_all(entries.iter().map(|e| store.get_json::<T>(e.id()))).await?;
    Ok(records.into_iter().flatten().collect())
}
