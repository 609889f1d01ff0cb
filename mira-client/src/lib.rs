//! Mira client reconnection layer
//!
//! Presents the consuming application a single continuous notification
//! stream despite transport churn. The layer owns:
//! - the connection state machine ([`state`]): Disconnected -> Connecting ->
//!   Authenticated -> Connected, with bounded-backoff automatic reconnects
//! - the bounded, most-recent-first notification buffer ([`buffer`])
//! - the mapping from payloads to transient UI alerts ([`alerts`])
//! - the reconnecting WebSocket driver itself ([`client`])
//!
//! Re-authentication happens implicitly on reconnect: the credential token
//! rides on every handshake, and the gateway re-associates the new
//! connection with the user's channel server-side, so there is no separate
//! re-subscribe call.

pub mod alerts;
pub mod buffer;
pub mod client;
pub mod state;

pub use alerts::{Alert, AlertSeverity};
pub use buffer::{BufferedNotification, NotificationBuffer};
pub use client::{ClientConfig, NotificationClient};
pub use state::{ConnectionState, RetryPolicy};
