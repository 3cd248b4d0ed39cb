//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use plastiscan_analysis::Analyzer;
use plastiscan_config::Settings;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::rate_limit::RateLimiter;
use crate::routes;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Arc<Analyzer>,
    pub limiter: RateLimiter,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(analyzer: Analyzer, limiter: RateLimiter, max_upload_bytes: usize) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            limiter,
            max_upload_bytes,
        }
    }

    pub fn from_settings(settings: &Settings) -> plastiscan_core::Result<Self> {
        Ok(Self::new(
            Analyzer::from_settings(settings)?,
            RateLimiter::new(settings.rate_limit_max, settings.rate_limit_window),
            settings.max_upload_bytes,
        ))
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(routes::upload_page))
        .route("/analyze", post(routes::analyze_form))
        .route("/api/analyze", post(routes::analyze_api))
        .route("/api/schema", get(routes::schema))
        .route("/api/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    info!(
        provider = state.analyzer.provider_name(),
        model = state.analyzer.model(),
        "Starting gateway"
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
