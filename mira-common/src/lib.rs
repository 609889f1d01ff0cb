//! # Mira Common Library
//!
//! Shared code for the Mira notification gateway and its client:
//! - Notification payload types (NotificationPayload, NotificationKind, Priority)
//! - WebSocket wire protocol messages (ServerMessage, ClientMessage)
//! - Token authentication primitives
//! - Shared error types

pub mod auth;
pub mod error;
pub mod events;
pub mod protocol;

pub use error::{Error, Result};
pub use events::{NotificationKind, NotificationPayload, Priority};
pub use protocol::{ClientMessage, ServerMessage};
