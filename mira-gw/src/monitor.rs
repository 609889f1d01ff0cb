//! Connection health monitor
//!
//! Runs one periodic sweep task for the whole gateway. Each sweep walks a
//! snapshot of registered connections and drives the per-connection probe
//! state machine: an Open connection gets a probe (WebSocket Ping frame)
//! and moves to Pending; a Pending connection whose probe has gone
//! unanswered past the timeout is reaped: unregistered and told to close
//! its transport. Any inbound frame observed by the connection's read loop
//! resets the state to Open.
//!
//! Probe interval and timeout are configuration tunables (`probe_interval_ms`,
//! `probe_timeout_ms`).

use crate::registry::ConnectionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Periodic liveness prober and reaper
pub struct HealthMonitor {
    registry: Arc<ConnectionRegistry>,
    probe_interval: Duration,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        probe_interval: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            probe_interval,
            probe_timeout,
        }
    }

    /// Spawn the sweep loop; runs for the life of the process
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            interval_ms = self.probe_interval.as_millis() as u64,
            timeout_ms = self.probe_timeout.as_millis() as u64,
            "health monitor started"
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.probe_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; skip it so connections get a
            // full interval before their first probe.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }

    /// One pass over all connections: reap expired probes, probe the rest
    pub fn sweep(&self) {
        let handles = self.registry.all_connections();
        debug!(connections = handles.len(), "health sweep");

        for handle in handles {
            if handle.probe_expired(self.probe_timeout) {
                warn!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "probe timeout, reaping connection"
                );
                // ProbeTimeout is treated identically to a transport-level
                // failure: the same idempotent teardown path.
                self.registry.unregister(handle.id);
                handle.shutdown();
            } else {
                handle.send_probe();
            }
        }
    }
}
