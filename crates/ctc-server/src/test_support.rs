//! In-process harness for driving the router in tests.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use ctc_store::{
    BlobStore, InMemoryBlobStore, InMemoryKvStore, KvStore, StoreError, StoreResult, Storage,
    StoredBlob,
};
use ctc_types::INDEX_KEY;

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;

pub const BOUNDARY: &str = "ctc-test-boundary";
pub const INDEX_HTML: &str = "<!doctype html><title>C-Terminal Community</title>";

pub struct TestApp {
    router: Router,
    pub storage: Storage,
    _static_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(Storage::in_memory())
    }

    pub fn with_storage(storage: Storage) -> Self {
        Self::build(storage, ServerConfig::default().max_upload_size)
    }

    /// An app whose request bodies are capped at `max_upload_size` bytes.
    pub fn with_max_upload(max_upload_size: usize) -> Self {
        Self::build(Storage::in_memory(), max_upload_size)
    }

    fn build(storage: Storage, max_upload_size: usize) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("index.html"), INDEX_HTML).unwrap();
        let config = ServerConfig {
            static_dir: static_dir.path().to_path_buf(),
            google_client_id: "test-client-id".into(),
            max_upload_size,
            ..ServerConfig::default()
        };
        let router = build_router(AppState::new(config, storage.clone()));
        Self {
            router,
            storage,
            _static_dir: static_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request with an optional bearer user and JSON body; decode the
    /// response body as JSON (`Null` when empty).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(AUTHORIZATION, format!("Bearer {user}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        json_response(self.send(builder.body(body).unwrap()).await).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(user), None).await
    }

    /// Create a post and return its JSON record.
    pub async fn create_post(&self, user: &str, body: Value) -> Value {
        let (status, json) = self.post("/api/posts", user, body).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json["post"].clone()
    }

    /// Multipart project upload.
    pub async fn upload(
        &self,
        user: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/projects")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(user) = user {
            builder = builder.header(AUTHORIZATION, format!("Bearer {user}"));
        }
        let request = builder.body(Body::from(multipart_body(fields, file))).unwrap();
        json_response(self.send(request).await).await
    }

    /// Upload a valid `.ctm` project and return its JSON record.
    pub async fn create_project(&self, user: &str, name: &str, tags: &str) -> Value {
        let (status, json) = self
            .upload(
                Some(user),
                &[("name", name), ("description", "a demo"), ("tags", tags)],
                Some(("demo.ctm", &b"CTM1 payload"[..])),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json["project"].clone()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_response(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn injected(what: &str) -> StoreError {
    StoreError::Io(io::Error::other(format!("injected {what} failure")))
}

/// Blob store whose deletes always fail.
#[derive(Debug, Default)]
pub struct FailingDeleteBlobStore {
    inner: InMemoryBlobStore,
}

#[async_trait]
impl BlobStore for FailingDeleteBlobStore {
    async fn put(&self, key: &str, blob: StoredBlob) -> StoreResult<()> {
        self.inner.put(key, blob).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        self.inner.get(key).await
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        Err(injected("blob delete"))
    }
}

/// Key-value store that refuses every write to the index key.
#[derive(Debug, Default)]
pub struct FailingIndexKvStore {
    inner: InMemoryKvStore,
}

#[async_trait]
impl KvStore for FailingIndexKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        if key == INDEX_KEY {
            return Err(injected("index write"));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_keys(prefix).await
    }
}

pub fn failing_index_kv() -> Arc<dyn KvStore> {
    Arc::new(FailingIndexKvStore::default())
}
