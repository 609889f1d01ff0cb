//! Mira Notification Gateway (mira-gw) - Main entry point
//!
//! Accepts persistent WebSocket connections from authenticated clients and
//! delivers notification payloads produced by backend jobs to the right
//! live connections.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mira_gw::api::{self, AppContext};
use mira_gw::config::{ConfigOverrides, GatewayConfig};
use mira_gw::{ConnectionRegistry, Dispatcher, HealthMonitor};

/// Command-line arguments for mira-gw
#[derive(Parser, Debug)]
#[command(name = "mira-gw")]
#[command(about = "Real-time notification gateway for Mira")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MIRA_GW_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, env = "MIRA_GW_CONFIG")]
    config: Option<PathBuf>,

    /// Shared secret for token verification (0 = generate at startup)
    #[arg(long, env = "MIRA_GW_SHARED_SECRET")]
    shared_secret: Option<i64>,

    /// Maximum accepted token age in milliseconds
    #[arg(long, env = "MIRA_GW_TOKEN_MAX_AGE_MS")]
    token_max_age_ms: Option<u64>,

    /// Liveness probe interval in milliseconds
    #[arg(long, env = "MIRA_GW_PROBE_INTERVAL_MS")]
    probe_interval_ms: Option<u64>,

    /// Liveness probe timeout in milliseconds
    #[arg(long, env = "MIRA_GW_PROBE_TIMEOUT_MS")]
    probe_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mira_gw=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = GatewayConfig::load(
        args.config.as_deref(),
        ConfigOverrides {
            port: args.port,
            shared_secret: args.shared_secret,
            token_max_age_ms: args.token_max_age_ms,
            probe_interval_ms: args.probe_interval_ms,
            probe_timeout_ms: args.probe_timeout_ms,
        },
    )
    .context("Failed to load configuration")?;

    // Auth is never disabled: without a configured secret, generate one for
    // this run (token issuers must then be pointed at it explicitly).
    if config.shared_secret == 0 {
        config.shared_secret = mira_common::auth::generate_shared_secret();
        info!("No shared secret configured, generated one for this run");
    }

    info!(
        port = config.port,
        probe_interval_ms = config.probe_interval_ms,
        probe_timeout_ms = config.probe_timeout_ms,
        "Starting Mira notification gateway"
    );

    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone());

    // Health monitor runs for the life of the process
    HealthMonitor::new(
        registry.clone(),
        Duration::from_millis(config.probe_interval_ms),
        Duration::from_millis(config.probe_timeout_ms),
    )
    .spawn();

    let ctx = AppContext {
        registry,
        dispatcher,
        config: Arc::new(config),
    };

    api::run(ctx, shutdown_signal()).await?;

    info!("Gateway shutdown complete");
    Ok(())
}


/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
