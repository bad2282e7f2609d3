//! HTTP server: shared state, router assembly and graceful shutdown.

pub mod extract;
pub mod page;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, extract::State, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Database;
use crate::notify::Notifier;
use crate::routes;

/// Everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: Config, db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            db,
            notifier,
        }
    }

    /// How long a new session lives
    pub fn session_lifetime(&self, remember: bool) -> chrono::Duration {
        if remember {
            chrono::Duration::days(self.config.remember_days)
        } else {
            chrono::Duration::minutes(self.config.session_lifetime_minutes)
        }
    }

    pub fn upload_root(&self) -> &Path {
        Path::new(&self.config.upload_dir)
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    // Room for a handful of images per multipart request
    let body_limit = state.config.max_upload_bytes.saturating_mul(10).max(1024 * 1024);

    Router::new()
        .route("/health", get(health))
        .merge(routes::auth::routes())
        .merge(routes::profile::routes())
        .merge(routes::dashboard::routes())
        .merge(routes::admin::routes())
        .merge(routes::properties::routes())
        .merge(routes::favorites::routes())
        .merge(routes::settings::routes())
        .merge(routes::meta::routes())
        .nest_service("/storage", ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!("Health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Bind to the configured port and serve until Ctrl+C or SIGTERM
pub async fn serve(state: AppState) -> Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
