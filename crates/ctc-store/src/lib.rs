//! Storage backends for the C-Terminal Community.
//!
//! Two collaborators back every resource handler:
//!
//! - a key-value store mapping string keys to JSON strings, one logical
//!   namespace per resource ([`KvStore`])
//! - a blob store holding uploaded project files ([`BlobStore`])
//!
//! # Backends
//!
//! - [`InMemoryKvStore`] / [`InMemoryBlobStore`] -- map-backed, for tests and
//!   ephemeral servers
//! - [`DirKvStore`] / [`DirBlobStore`] -- one file per key under a directory
//!
//! [`Storage`] bundles the five namespaces and the blob store behind trait
//! objects so handlers never name a concrete backend.
//!
//! # Design Rules
//!
//! 1. The store never interprets values; JSON decoding lives in [`KvStoreExt`].
//! 2. There are no transactions and no compare-and-set. Read-modify-write
//!    sequences built on top of these traits can lose updates under
//!    concurrent writers.
//! 3. Calls either complete or fail; nothing here retries.

pub mod dir;
pub mod error;
pub mod memory;
pub mod storage;
pub mod traits;

pub use dir::{DirBlobStore, DirKvStore};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryBlobStore, InMemoryKvStore};
pub use storage::{Namespace, Storage};
pub use traits::{BlobStore, KvStore, KvStoreExt, StoredBlob};
