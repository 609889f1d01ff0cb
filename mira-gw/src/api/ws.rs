//! WebSocket handshake and per-connection tasks
//!
//! `GET /ws?token=...`: the credential token rides on the upgrade request
//! and is verified *before* the upgrade completes. A bad token yields HTTP
//! 401 and the connection is never registered; no partially-registered
//! connections can exist.
//!
//! After a successful upgrade the socket is split: a writer task drains the
//! connection's outbound queue (notifications, pong acks, liveness probes)
//! into the transport, while the read loop handles client keep-alives and
//! marks liveness on every inbound frame. Whatever ends first (peer close,
//! transport error, or a health-monitor reap) funnels through the single
//! idempotent teardown at the bottom of `handle_socket`.

use crate::api::server::AppContext;
use crate::registry::{ConnectionHandle, OutboundFrame};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use mira_common::auth::verify_token;
use mira_common::protocol::{ClientMessage, ServerMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub message: String,
}

/// GET /ws - authenticated WebSocket handshake
pub async fn ws_upgrade(
    State(ctx): State<AppContext>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.as_deref().unwrap_or("");
    match verify_token(token, ctx.config.shared_secret, ctx.config.token_max_age_ms) {
        Ok(user_id) => ws.on_upgrade(move |socket| handle_socket(ctx, user_id, socket)),
        Err(e) => {
            warn!(error = %e, "handshake rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(AuthErrorResponse {
                    error: "authentication_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Per-connection task: register, run the read loop, tear down exactly once
async fn handle_socket(ctx: AppContext, user_id: Uuid, socket: WebSocket) {
    let conn_id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = Arc::new(ConnectionHandle::new(conn_id, user_id, tx));

    // Registration happens only after authentication succeeded; this is
    // also what associates the connection with the user's channel; there
    // is no separate subscribe step for clients to perform.
    ctx.registry.register(user_id, conn_id, handle.clone());
    info!(%user_id, %conn_id, "connection open");

    handle.send(ServerMessage::Ready {
        connection_id: conn_id,
    });

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_loop(sink, rx));

    read_loop(&handle, stream).await;

    // Single idempotent teardown path, shared by peer close, transport
    // error, and health-monitor reap (reap unregisters first; the repeat
    // call here is a no-op).
    ctx.registry.unregister(conn_id);
    handle.shutdown();
    let _ = writer.await;
    info!(%user_id, %conn_id, "connection closed");
}

/// Drain the outbound queue into the transport
async fn write_loop(
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    while let Some(frame) = rx.recv().await {
        let message = match frame {
            OutboundFrame::Message(msg) => match serde_json::to_string(&msg) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    warn!("failed to serialize outbound message: {}", e);
                    continue;
                }
            },
            OutboundFrame::Probe => Message::Ping(Vec::new()),
            OutboundFrame::Shutdown => break,
        };

        if sink.send(message).await.is_err() {
            // Transport gone; the read loop observes the same failure and
            // owns the teardown.
            break;
        }
    }
    let _ = sink.close().await;
}

/// Handle inbound frames until the peer disconnects
async fn read_loop(
    handle: &Arc<ConnectionHandle>,
    mut stream: futures::stream::SplitStream<WebSocket>,
) {
    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(msg) => msg,
            Err(e) => {
                // Abrupt transport failure is treated identically to a
                // graceful disconnect.
                debug!(conn_id = %handle.id, "transport error: {}", e);
                break;
            }
        };

        // Any inbound frame counts as liveness, including pong answers to
        // health-monitor probes.
        handle.mark_alive();

        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping { seq }) => {
                    handle.send(ServerMessage::Pong { seq });
                }
                Err(e) => {
                    debug!(conn_id = %handle.id, "ignoring unparseable client frame: {}", e);
                }
            },
            Message::Close(_) => {
                debug!(conn_id = %handle.id, "peer closed connection");
                break;
            }
            // Ping frames are answered automatically by the transport;
            // Pong and Binary need no handling beyond the liveness mark.
            _ => {}
        }
    }
}
