//! HTTP/WebSocket API for the notification gateway
//!
//! - `GET /ws`: authenticated WebSocket handshake for clients
//! - `POST /notify`, `POST /broadcast`: producer dispatch surface
//! - `GET /online/:user_id`, `GET /stats`, `GET /health`: operational
//!   visibility (not exposed to end users)

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{create_router, run, AppContext};
