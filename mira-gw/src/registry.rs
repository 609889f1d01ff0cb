//! Connection registry
//!
//! Maps each user identity to the set of currently open connections owned by
//! that user. A user's logical delivery channel is a derived view over this
//! map ("the connections whose owning user id equals this value"), not a
//! separately stored membership list, so the registry is the single source
//! of truth.
//!
//! Concurrency contract: the registry map is the only shared mutable state
//! in the gateway. All mutation goes through `register`/`unregister` under
//! the internal lock; the dispatcher and health monitor only take snapshot
//! reads and never hold the lock across a send.

use chrono::{DateTime, Utc};
use mira_common::protocol::ServerMessage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

/// Opaque connection identifier, allocated per accepted handshake
pub type ConnectionId = Uuid;

/// User identity extracted from the credential token
pub type UserId = Uuid;

/// Frame queued for a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// JSON protocol message
    Message(ServerMessage),

    /// Liveness probe, sent as a WebSocket Ping control frame
    Probe,

    /// Orderly teardown: the writer closes the transport and exits
    Shutdown,
}

/// Liveness probe state machine per connection: Open -> Pending -> reaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Connection considered live
    Open,

    /// Probe sent, response outstanding since `sent_at`
    Pending { sent_at: Instant },
}

/// One open, authenticated connection
///
/// Owns the sending side of the connection's outbound queue plus its probe
/// state. The user id is fixed at registration; unauthenticated connections
/// never get a handle.
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub connected_at: DateTime<Utc>,
    tx: mpsc::UnboundedSender<OutboundFrame>,
    probe: Mutex<ProbeState>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, user_id: UserId, tx: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            id,
            user_id,
            connected_at: Utc::now(),
            tx,
            probe: Mutex::new(ProbeState::Open),
        }
    }

    /// Queue a protocol message; returns false if the writer task is gone
    pub fn send(&self, message: ServerMessage) -> bool {
        self.tx.send(OutboundFrame::Message(message)).is_ok()
    }

    /// Queue a liveness probe and enter Pending, unless one is outstanding
    pub fn send_probe(&self) {
        let mut probe = self.probe.lock().unwrap();
        if matches!(*probe, ProbeState::Open) && self.tx.send(OutboundFrame::Probe).is_ok() {
            *probe = ProbeState::Pending {
                sent_at: Instant::now(),
            };
        }
    }

    /// Record inbound activity: any frame from the peer resets the probe
    /// state machine back to Open
    pub fn mark_alive(&self) {
        *self.probe.lock().unwrap() = ProbeState::Open;
    }

    /// True if a probe has been outstanding longer than `timeout`
    pub fn probe_expired(&self, timeout: Duration) -> bool {
        match *self.probe.lock().unwrap() {
            ProbeState::Pending { sent_at } => sent_at.elapsed() >= timeout,
            ProbeState::Open => false,
        }
    }

    /// Ask the writer task to close the transport
    pub fn shutdown(&self) {
        let _ = self.tx.send(OutboundFrame::Shutdown);
    }
}

/// Inner map state, guarded by one lock so the channel map and the
/// connection-to-owner index can never diverge
#[derive(Default)]
struct RegistryInner {
    /// user id -> open connections owned by that user
    channels: HashMap<UserId, HashMap<ConnectionId, Arc<ConnectionHandle>>>,

    /// connection id -> owning user, for O(1) unregister
    owners: HashMap<ConnectionId, UserId>,
}

/// Thread-safe registry of open connections, keyed by user id
///
/// Invariants:
/// - a connection id appears in at most one user's set
/// - a user entry with zero connections is removed immediately (no stale
///   empty entries are ever retained)
/// - `unregister` is idempotent
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the user's channel, creating it if absent
    ///
    /// Idempotent under duplicate registration (set semantics: re-inserting
    /// the same connection id replaces the existing handle).
    pub fn register(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        handle: Arc<ConnectionHandle>,
    ) {
        let mut inner = self.inner.write().unwrap();

        // A connection id lives in at most one user's set. Ids are fresh
        // v4 UUIDs so a cross-user re-registration should not happen, but
        // if it does the stale entry must not linger in the old set.
        if let Some(prev_user) = inner.owners.get(&conn_id).copied() {
            if prev_user != user_id {
                if let Some(set) = inner.channels.get_mut(&prev_user) {
                    set.remove(&conn_id);
                    if set.is_empty() {
                        inner.channels.remove(&prev_user);
                    }
                }
            }
        }

        inner.channels.entry(user_id).or_default().insert(conn_id, handle);
        inner.owners.insert(conn_id, user_id);
        debug!(%user_id, %conn_id, "connection registered");
    }

    /// Remove a connection from whichever user's set contains it
    ///
    /// Deletes the user entry when its set empties. Safe to call for an id
    /// that was never registered or was already removed (no-op, returns
    /// false).
    pub fn unregister(&self, conn_id: ConnectionId) -> bool {
        let mut inner = self.inner.write().unwrap();
        let Some(user_id) = inner.owners.remove(&conn_id) else {
            trace!(%conn_id, "unregister for unknown connection ignored");
            return false;
        };

        if let Some(set) = inner.channels.get_mut(&user_id) {
            set.remove(&conn_id);
            if set.is_empty() {
                inner.channels.remove(&user_id);
            }
        }
        debug!(%user_id, %conn_id, "connection unregistered");
        true
    }

    /// True iff the user has at least one open connection
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.inner.read().unwrap().channels.contains_key(&user_id)
    }

    /// Number of distinct users with at least one open connection
    pub fn count_online_users(&self) -> usize {
        self.inner.read().unwrap().channels.len()
    }

    /// Total number of open connections across all users
    pub fn count_connections(&self) -> usize {
        self.inner.read().unwrap().owners.len()
    }

    /// Snapshot of the user's connection handles (empty if offline)
    ///
    /// The lock is released before the caller performs any send.
    pub fn user_connections(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.inner
            .read()
            .unwrap()
            .channels
            .get(&user_id)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every registered connection handle
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.inner
            .read()
            .unwrap()
            .channels
            .values()
            .flat_map(|set| set.values().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(user_id: UserId, conn_id: ConnectionId) -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(ConnectionHandle::new(conn_id, user_id, tx))
    }

    #[test]
    fn test_count_tracks_distinct_users() {
        let registry = ConnectionRegistry::new();
        let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        registry.register(user_a, c1, handle(user_a, c1));
        registry.register(user_a, c2, handle(user_a, c2));
        registry.register(user_b, c3, handle(user_b, c3));

        assert_eq!(registry.count_online_users(), 2);
        assert_eq!(registry.count_connections(), 3);
        assert!(registry.is_online(user_a));
        assert!(registry.is_online(user_b));
    }

    #[test]
    fn test_no_empty_entries_after_last_disconnect() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());

        registry.register(user, c1, handle(user, c1));
        registry.register(user, c2, handle(user, c2));

        assert!(registry.unregister(c1));
        assert!(registry.is_online(user));

        assert!(registry.unregister(c2));
        assert!(!registry.is_online(user));
        assert_eq!(registry.count_online_users(), 0);
        assert_eq!(registry.count_connections(), 0);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.register(user, conn, handle(user, conn));
        assert!(registry.unregister(conn));

        // Second removal is a no-op, not an error
        assert!(!registry.unregister(conn));
        assert_eq!(registry.count_online_users(), 0);

        // Unknown id is also a no-op
        assert!(!registry.unregister(Uuid::new_v4()));
    }

    #[test]
    fn test_duplicate_registration_keeps_set_semantics() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.register(user, conn, handle(user, conn));
        registry.register(user, conn, handle(user, conn));

        assert_eq!(registry.count_connections(), 1);
        assert_eq!(registry.user_connections(user).len(), 1);
    }

    #[test]
    fn test_reregistration_under_new_user_moves_connection() {
        let registry = ConnectionRegistry::new();
        let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());
        let conn = Uuid::new_v4();

        registry.register(user_a, conn, handle(user_a, conn));
        registry.register(user_b, conn, handle(user_b, conn));

        // The id belongs to exactly one user's set; no stale entry remains
        assert!(!registry.is_online(user_a));
        assert!(registry.is_online(user_b));
        assert_eq!(registry.count_connections(), 1);
        assert_eq!(registry.user_connections(user_a).len(), 0);
        assert_eq!(registry.user_connections(user_b).len(), 1);
    }

    #[test]
    fn test_snapshots_scoped_to_channel() {
        let registry = ConnectionRegistry::new();
        let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());

        registry.register(user_a, c1, handle(user_a, c1));
        registry.register(user_b, c2, handle(user_b, c2));

        assert_eq!(registry.user_connections(user_a).len(), 1);
        assert_eq!(registry.user_connections(Uuid::new_v4()).len(), 0);
        assert_eq!(registry.all_connections().len(), 2);
    }

    #[tokio::test]
    async fn test_probe_state_machine() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Arc::new(ConnectionHandle::new(conn, user, tx));
        registry.register(user, conn, handle.clone());

        // Open -> Pending on probe
        handle.send_probe();
        assert_eq!(rx.recv().await, Some(OutboundFrame::Probe));
        assert!(!handle.probe_expired(Duration::from_secs(60)));

        // A second probe while Pending is suppressed
        handle.send_probe();
        assert!(rx.try_recv().is_err());

        // Pending -> Open on inbound activity; probing re-arms
        handle.mark_alive();
        handle.send_probe();
        assert_eq!(rx.recv().await, Some(OutboundFrame::Probe));
    }
}
