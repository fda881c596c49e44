//! HTTP service.
//!
//! This module provides:
//! - The axum router with `POST /api/rag` and `GET /health` (`router`)
//! - Handler-side timeout and single-retry policy (`retry`)
//! - The `{code, message}` error envelope (`error`)
//! - Configuration types (`config`)

pub mod config;
pub mod error;
pub mod handlers;
pub mod retry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::RagClient;

pub use error::ApiError;
pub use retry::RetryPolicy;

/// Shared handler state.
pub struct AppState {
    pub client: Arc<RagClient>,
    pub policy: RetryPolicy,
}

impl AppState {
    pub fn new(client: Arc<RagClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/rag", post(handlers::ask))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S) -> std::io::Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
