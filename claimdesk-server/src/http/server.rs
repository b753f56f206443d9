//! Axum server setup
//!
//! Server skeleton with:
//! - Tracing middleware
//! - Request timeout
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use claimdesk_core::{Backend, DeskConfig};

use super::routes;
use crate::drafts::DraftStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,

    /// Mark the session cookie `Secure` (only sent over HTTPS)
    pub cookie_secure: bool,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cookie_secure: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DeskConfig> for ServerConfig {
    fn from(config: &DeskConfig) -> Self {
        Self {
            bind_addr: config.server.bind,
            cookie_secure: config.server.cookie_secure,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    /// Working copies of each signed-in user's tables
    pub drafts: DraftStore,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, cookie_secure: bool) -> Self {
        Self {
            backend,
            drafts: DraftStore::new(),
            cookie_secure,
        }
    }
}

/// Build the application router with all routes
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(timeout_layer(request_timeout));

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::protected::router())
        .merge(routes::api::router())
        .layer(middleware)
        .with_state(state)
}

/// Requests running longer than `request_timeout` answer 408.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let backend = Arc::new(SupabaseClient::from_config(&config)?);
/// run_server(backend, ServerConfig::from(&config)).await?;
/// ```
pub async fn run_server(backend: Arc<dyn Backend>, config: ServerConfig) -> Result<(), ServerError> {
    if !config.cookie_secure {
        tracing::warn!("Session cookie is not marked Secure; serve behind HTTPS in production");
    }
    let state = Arc::new(AppState::new(backend, config.cookie_secure));
    let app = build_router(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
