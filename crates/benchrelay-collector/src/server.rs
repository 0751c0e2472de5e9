//! Collector server implementation.
//!
//! Assembles the ingestion routes, the liveness endpoint, and the shared
//! application state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use benchrelay_core::Result;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::notify::{LogNotifier, ResultNotifier};
use crate::progress::ProgressStore;
use crate::store::ArtifactStore;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Credential gate applied to every report.
    pub auth: AuthGate,
    /// In-memory progress state.
    pub progress: Arc<ProgressStore>,
    /// Result bundle persistence.
    pub store: ArtifactStore,
    /// Notification collaborator (best-effort).
    pub notifier: Arc<dyn ResultNotifier>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .field("progress", &self.progress)
            .field("store", &self.store)
            .field("notifier", &"<ResultNotifier>")
            .finish()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Liveness endpoint handler. No auth; a shallow check that the collector
/// is accepting requests.
async fn ping() -> impl IntoResponse {
    tracing::info!("received ping");
    "pong"
}

// ============================================================================
// Server
// ============================================================================

/// The collector server.
pub struct Server {
    config: Config,
    progress: Arc<ProgressStore>,
    notifier: Arc<dyn ResultNotifier>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("progress", &self.progress)
            .field("notifier", &"<ResultNotifier>")
            .finish()
    }
}

impl Server {
    /// Creates a new server with the given configuration and default
    /// collaborators (no progress listener, log-based notifier).
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: Arc::new(ProgressStore::new()),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Creates a new `ServerBuilder`.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the progress store request handlers update.
    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState {
            auth: AuthGate::new(self.config.effective_secret()),
            store: ArtifactStore::new(self.config.storage_root.clone()),
            progress: Arc::clone(&self.progress),
            notifier: Arc::clone(&self.notifier),
            config: self.config.clone(),
        });

        Router::new()
            .route("/ping", get(ping))
            .merge(crate::routes::ingestion_routes())
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the server
    /// cannot bind to the port.
    pub async fn serve(&self) -> Result<()> {
        self.config.validate()?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let router = self.create_router();

        tracing::info!(
            port = self.config.port,
            storage_root = %self.config.storage_root.display(),
            "starting benchrelay collector"
        );

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            benchrelay_core::Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            }
        })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| benchrelay_core::Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to exercise the
    /// routes without actually binding to a port.
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }
}

/// Builder for constructing a server.
pub struct ServerBuilder {
    config: Config,
    progress: Arc<ProgressStore>,
    notifier: Arc<dyn ResultNotifier>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("progress", &self.progress)
            .field("notifier", &"<ResultNotifier>")
            .finish()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            progress: Arc::new(ProgressStore::new()),
            notifier: Arc::new(LogNotifier),
        }
    }
}

impl ServerBuilder {
    /// Creates a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the shared secret workers must present.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = Some(secret.into());
        self
    }

    /// Sets the root directory result bundles are persisted under.
    #[must_use]
    pub fn storage_root(mut self, root: impl Into<std::path::PathBuf>) -> Self {
        self.config.storage_root = root.into();
        self
    }

    /// Sets the progress store used by request handlers.
    ///
    /// By default the server owns a fresh, listener-less store; inject one
    /// to attach a progress listener or to observe state from tests.
    #[must_use]
    pub fn progress_store(mut self, progress: Arc<ProgressStore>) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the notification collaborator signalled after each upload.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn ResultNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            progress: self.progress,
            notifier: self.notifier,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
