//! Portal server

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::schedule::SystemClock;
use crate::store::{MemoryStore, PgStore};
use crate::{Error, Result};

/// Captive portal HTTP server
pub struct Portal {
    /// Shared state handed to every request
    state: Arc<AppState>,
}

impl Portal {
    /// Create a portal backed by Postgres.
    ///
    /// The pool connects lazily and a failed migration only logs a warning,
    /// so the portal starts even when the database is down.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL or other configuration is invalid.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(PgStore::connect_lazy(&config.database)?);
        if let Err(e) = store.migrate().await {
            warn!(error = %e, "Database initialization failed, continuing without it");
        }
        Self::with_state(AppState::new(config, store, Arc::new(SystemClock))?)
    }

    /// Create a portal with an in-process store. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn in_memory(config: Config) -> Result<Self> {
        warn!("Using in-memory store, data is lost on exit");
        Self::with_state(AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )?)
    }

    fn with_state(state: AppState) -> Result<Self> {
        Ok(Self {
            state: Arc::new(state),
        })
    }

    /// Run the portal until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self) -> Result<()> {
        let config = Arc::clone(&self.state.config);
        let addr = SocketAddr::new(
            config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            config.server.port,
        );

        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("WIFI PORTAL v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %config.server.host, port = %config.server.port, "Listening");
        info!(
            callback_base = %config.oauth.public_base_url,
            utc_offset = %config.schedule.utc_offset,
            "OAuth callbacks and ad schedule"
        );

        if config.database.is_default_url() {
            warn!("DATABASE_URL not set, using built-in development database URL");
        }
        if config.admin.uses_default_credentials() {
            warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, using built-in admin credentials");
        }
        if !config.settings.redact_secrets {
            warn!("GET /api/settings returns OAuth client secrets (settings.redact_secrets = false)");
        }
        info!("============================================================");

        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        let mut deadline_rx = shutdown_tx.subscribe();
        let timeout = config.server.shutdown_timeout;

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .into_future();

        // In-flight requests get `shutdown_timeout` to finish after the signal
        let deadline = async move {
            let _ = deadline_rx.recv().await;
            tokio::time::sleep(timeout).await;
        };

        tokio::select! {
            result = server => result.map_err(|e| Error::Internal(e.to_string()))?,
            () = deadline => warn!(timeout = ?timeout, "Graceful shutdown timed out, dropping open connections"),
        }

        info!("Portal stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
