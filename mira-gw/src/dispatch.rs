//! Notification dispatcher
//!
//! Resolves a user id to the user's channel (the set of that user's open
//! connections) and pushes payloads to each one. Holds no state of its own
//! beyond a read reference to the registry, so dispatch calls can run
//! concurrently; the push loop only touches snapshots.
//!
//! Both operations are fire-and-forget: a target user with no open
//! connections is a silent no-op, a closed outbound queue is skipped, and no
//! error ever reaches producer code. Successful dispatch means the push was
//! attempted on an open connection, not that the client received it.

use crate::registry::ConnectionRegistry;
use mira_common::events::NotificationPayload;
use mira_common::protocol::ServerMessage;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Pushes notification payloads to live connections
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Push a payload to every open connection of one user
    ///
    /// Returns the number of delivery attempts (0 when the user is offline,
    /// which is not an error; the payload is dropped).
    pub fn send_to_user(&self, user_id: Uuid, payload: NotificationPayload) -> usize {
        let handles = self.registry.user_connections(user_id);
        if handles.is_empty() {
            debug!(%user_id, kind = ?payload.kind, "dispatch miss: user offline, payload dropped");
            return 0;
        }

        let message = ServerMessage::Notification {
            payload,
            delivered_at: NotificationPayload::current_timestamp_ms(),
        };

        let mut attempts = 0;
        for handle in handles {
            if handle.send(message.clone()) {
                attempts += 1;
            } else {
                // Writer task already gone; teardown is owned by the
                // connection task, not the dispatcher.
                debug!(conn_id = %handle.id, "skipped push to closing connection");
            }
        }
        debug!(%user_id, attempts, "dispatched notification to user channel");
        attempts
    }

    /// Push a payload to every connection registered at call time,
    /// regardless of channel
    ///
    /// A connection registered strictly after the snapshot is taken is not
    /// guaranteed to receive the payload.
    pub fn broadcast(&self, payload: NotificationPayload) -> usize {
        let handles = self.registry.all_connections();
        let message = ServerMessage::Notification {
            payload,
            delivered_at: NotificationPayload::current_timestamp_ms(),
        };

        let mut attempts = 0;
        for handle in handles {
            if handle.send(message.clone()) {
                attempts += 1;
            }
        }
        debug!(attempts, "broadcast notification to all channels");
        attempts
    }
}
