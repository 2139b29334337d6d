use std::sync::Arc;

use ctc_store::{KvStore, Namespace, Storage};

use crate::auth::{AuthProvider, TrustedBearerAuth};
use crate::config::ServerConfig;

/// Shared, immutable handler state. Every request gets a clone; nothing in
/// here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, storage: Storage) -> Self {
        Self {
            storage,
            auth: Arc::new(TrustedBearerAuth),
            config: Arc::new(config),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn kv(&self, ns: Namespace) -> &dyn KvStore {
        self.storage.kv(ns)
    }
}
