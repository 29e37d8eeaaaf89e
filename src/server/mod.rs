//! HTTP surface for the word pools and the leaderboard.

pub mod error;
pub mod handlers;
pub mod request_tracing;

pub use error::ApiError;

use crate::config::ServerConfig;
use crate::language::WordCatalog;
use crate::leaderboard::{LeaderboardStore, StoreError};
use axum::http::{header, Method};
use axum::middleware::from_fn;
use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared per-process state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeaderboardStore>,
    pub catalog: WordCatalog,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn LeaderboardStore>, catalog: WordCatalog, config: ServerConfig) -> Self {
        Self {
            store,
            catalog,
            config: Arc::new(config),
        }
    }

    /// Run a store call on the blocking pool; backends do file and database I/O.
    pub(crate) async fn with_store<T, F>(&self, f: F) -> Result<Result<T, StoreError>, ApiError>
    where
        F: FnOnce(&dyn LeaderboardStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::api_info))
        .route("/api", get(handlers::api_info))
        .route("/api/languages", get(handlers::list_languages))
        .route("/api/words/{language}", get(handlers::words))
        .route(
            "/api/leaderboard",
            get(handlers::leaderboard_overview).post(handlers::submit_score),
        )
        .route(
            "/api/leaderboard/{language}",
            get(handlers::leaderboard_for_language),
        )
        .route("/api/scores", axum::routing::post(handlers::submit_score))
        .route("/api/scores/{id}", delete(handlers::delete_score))
        .route("/api/stats", get(handlers::stats))
        .fallback(handlers::not_found)
        .layer(from_fn(request_tracing::request_tracing_middleware))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let bind = state.config.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %listener.local_addr()?, backend = %state.store.backend(), "server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
