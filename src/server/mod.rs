// HTTP front-end
// Serves the chat page and answers questions over JSON

pub mod errors;
pub mod handlers;


use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::rag::RetrievalChain;

pub use errors::ApiError;

/// Outcome of the startup initialization phase
pub enum ChainState {
    Ready(Arc<RetrievalChain>),
    /// Initialization failed; the reason is reported on `/health`
    Unavailable(String),
}

/// Shared, read-only state handed to every request
pub struct AppState {
    pub chain: ChainState,
}

impl AppState {
    #[inline]
    pub fn ready(chain: RetrievalChain) -> Self {
        Self {
            chain: ChainState::Ready(Arc::new(chain)),
        }
    }

    #[inline]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            chain: ChainState::Unavailable(reason.into()),
        }
    }

    /// Run the initialization phase; failures leave the server up but not ready
    #[inline]
    pub async fn initialize(config: &Config) -> Self {
        match RetrievalChain::from_config(config).await {
            Ok(chain) => {
                info!("RAG initialized successfully.");
                Self::ready(chain)
            }
            Err(e) => {
                error!("Failed to initialize RAG: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }
}

#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize the chain and serve until Ctrl-C
///
/// `host` and `port` override the configured bind address.
#[inline]
pub async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let state = Arc::new(AppState::initialize(config).await);

    let mut server = config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    let bind_addr = server.bind_address();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    info!("Serving on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
