//! HTTP server setup and routing
//!
//! Sets up the Axum server with routes for the WebSocket handshake, the
//! producer dispatch endpoints, and the operational query surface.

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::registry::ConnectionRegistry;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>` for
/// free via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Dispatcher,
    pub config: Arc<GatewayConfig>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Client handshake: token verified before the upgrade completes
        .route("/ws", get(super::ws::ws_upgrade))

        // Producer dispatch surface (fire-and-forget)
        .route("/notify", post(super::handlers::notify))
        .route("/broadcast", post(super::handlers::broadcast))

        // Operational visibility
        .route("/online/:user_id", get(super::handlers::online))
        .route("/stats", get(super::handlers::stats))

        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Attach application context
        .with_state(ctx)

        // Enable CORS for browser clients and trace all requests
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP/WebSocket server until shutdown
pub async fn run(ctx: AppContext, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.port));
    let app = create_router(ctx);

    info!("Starting gateway server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
