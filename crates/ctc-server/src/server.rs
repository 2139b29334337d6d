use tokio::net::TcpListener;

use ctc_store::Storage;

use crate::config::{ServerConfig, StorageConfig};
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The community API server.
pub struct CtcServer {
    config: ServerConfig,
    storage: Storage,
}

impl CtcServer {
    pub fn new(config: ServerConfig, storage: Storage) -> Self {
        Self { config, storage }
    }

    /// Open the storage backend named by the config.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let storage = match &config.storage {
            StorageConfig::Memory => Storage::in_memory(),
            StorageConfig::Dir { path } => {
                tracing::info!("opening directory store at {}", path.display());
                Storage::open_dir(path).await?
            }
        };
        Ok(Self::new(config, storage))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.config.clone(), self.storage.clone()))
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("C-Terminal Community server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
