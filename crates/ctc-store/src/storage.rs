use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::dir::{DirBlobStore, DirKvStore};
use crate::error::StoreResult;
use crate::memory::{InMemoryBlobStore, InMemoryKvStore};
use crate::traits::{BlobStore, KvStore};

/// One logical key-value namespace per resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Users,
    Posts,
    Projects,
    Comments,
    Likes,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Self::Users,
        Self::Posts,
        Self::Projects,
        Self::Comments,
        Self::Likes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Projects => "projects",
            Self::Comments => "comments",
            Self::Likes => "likes",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full set of stores a server talks to.
///
/// Cloning is cheap: every backend sits behind an `Arc`.
#[derive(Clone)]
pub struct Storage {
    users: Arc<dyn KvStore>,
    posts: Arc<dyn KvStore>,
    projects: Arc<dyn KvStore>,
    comments: Arc<dyn KvStore>,
    likes: Arc<dyn KvStore>,
    files: Arc<dyn BlobStore>,
}

impl Storage {
    /// Ephemeral storage: every namespace and the blob store live in memory.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryKvStore::new()),
            posts: Arc::new(InMemoryKvStore::new()),
            projects: Arc::new(InMemoryKvStore::new()),
            comments: Arc::new(InMemoryKvStore::new()),
            likes: Arc::new(InMemoryKvStore::new()),
            files: Arc::new(InMemoryBlobStore::new()),
        }
    }

    /// Durable storage under `root`: `kv/<namespace>/` per namespace and
    /// `files/` for blobs.
    pub async fn open_dir(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        let kv = root.join("kv");
        let open = |ns: Namespace| DirKvStore::open(kv.join(ns.as_str()));
        let storage = Self {
            users: Arc::new(open(Namespace::Users).await?),
            posts: Arc::new(open(Namespace::Posts).await?),
            projects: Arc::new(open(Namespace::Projects).await?),
            comments: Arc::new(open(Namespace::Comments).await?),
            likes: Arc::new(open(Namespace::Likes).await?),
            files: Arc::new(DirBlobStore::open(root.join("files")).await?),
        };
        tracing::info!("opened storage at {}", root.display());
        Ok(storage)
    }

    /// The key-value store backing `ns`.
    pub fn kv(&self, ns: Namespace) -> &dyn KvStore {
        match ns {
            Namespace::Users => self.users.as_ref(),
            Namespace::Posts => self.posts.as_ref(),
            Namespace::Projects => self.projects.as_ref(),
            Namespace::Comments => self.comments.as_ref(),
            Namespace::Likes => self.likes.as_ref(),
        }
    }

    pub fn files(&self) -> &dyn BlobStore {
        self.files.as_ref()
    }

    /// Replace one namespace's backend.
    pub fn with_kv(mut self, ns: Namespace, store: Arc<dyn KvStore>) -> Self {
        match ns {
            Namespace::Users => self.users = store,
            Namespace::Posts => self.posts = store,
            Namespace::Projects => self.projects = store,
            Namespace::Comments => self.comments = store,
            Namespace::Likes => self.likes = store,
        }
        self
    }

    /// Replace the blob store backend.
    pub fn with_files(mut self, files: Arc<dyn BlobStore>) -> Self {
        self.files = files;
        self
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("namespaces", &Namespace::ALL)
            .finish_non_exhaustive()
    }
}
