//! Mira notification gateway (mira-gw)
//!
//! Real-time delivery of asynchronously-produced events (generation
//! completions, quality alerts, system messages) to authenticated clients
//! over persistent WebSocket connections. A user may hold several
//! simultaneous connections (devices, tabs); delivery is addressed per
//! user and fans out to every live connection, at-least-once best-effort.
//!
//! Components:
//! - [`registry`]: user id -> open connections map, the single source of truth
//! - [`dispatch`]: per-user and broadcast payload push over registry snapshots
//! - [`monitor`]: periodic liveness probes and reaping of dead connections
//! - [`api`]: authenticated handshake plus the producer/ops HTTP surface

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod registry;

pub use config::GatewayConfig;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use monitor::HealthMonitor;
pub use registry::ConnectionRegistry;
