//! WebSocket wire protocol between the gateway and clients
//!
//! Messages are internally-tagged JSON enums (`{"type": "notification", ...}`),
//! one enum per direction.

use crate::events::NotificationPayload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Messages pushed from the gateway to connected clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted; sent once, immediately after registration
    Ready { connection_id: Uuid },

    /// Notification delivery, stamped with the dispatch time (epoch ms)
    Notification {
        payload: NotificationPayload,
        delivered_at: u64,
    },

    /// Acknowledgment of a client keep-alive ping
    Pong { seq: u64 },
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Messages sent from clients to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Lightweight keep-alive; the server answers with `Pong { seq }`
    Ping { seq: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationPayload;

    #[test]
    fn test_server_message_tagging() {
        let msg = ServerMessage::Notification {
            payload: NotificationPayload::generation_complete("done", "ok"),
            delivered_at: 1234,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["delivered_at"], 1234);
        assert_eq!(json["payload"]["kind"], "generation_complete");
    }

    #[test]
    fn test_ping_pong_round_trip() {
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping","seq":7}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping { seq: 7 });

        let pong = serde_json::to_string(&ServerMessage::Pong { seq: 7 }).unwrap();
        assert!(pong.contains(r#""type":"pong""#));
    }
}
