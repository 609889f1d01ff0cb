//! Reconnecting WebSocket driver
//!
//! Owns one background task that maintains a single logical session across
//! transport drops: dial, re-authenticate (the token rides on every upgrade
//! request), receive notifications into the shared buffer, emit transient
//! alerts, and keep the connection honest with client-side keep-alives.
//!
//! A missing keep-alive acknowledgment tears the session down proactively
//! instead of waiting for the transport's own timeout, which bounds
//! detection latency. Reconnects use bounded exponential backoff; once the
//! attempt cap is hit the driver stays Disconnected until `restart()` (e.g.
//! triggered by a user re-login).

use crate::alerts::Alert;
use crate::buffer::NotificationBuffer;
use crate::state::{ConnectionState, RetryPolicy};
use futures::{SinkExt, StreamExt};
use mira_common::protocol::{ClientMessage, ServerMessage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway WebSocket endpoint, e.g. `ws://127.0.0.1:5760/ws`
    pub url: String,

    /// Credential token presented on every handshake
    pub token: String,

    /// Interval between client keep-alive pings while Connected
    pub keepalive_interval: Duration,

    /// How long a keep-alive may go unacknowledged before the session is
    /// torn down proactively
    pub ack_timeout: Duration,

    pub retry: RetryPolicy,

    /// Local notification buffer capacity
    pub buffer_capacity: usize,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            keepalive_interval: Duration::from_secs(20),
            ack_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            buffer_capacity: 50,
        }
    }

    fn dial_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

#[derive(Debug)]
enum Command {
    Restart,
    Shutdown,
}

/// How a session ended, decides what the outer loop does next
enum SessionEnd {
    /// Transport dropped or keep-alive ack missing: retry with backoff
    Transport,

    /// External restart requested: retry immediately, counter reset
    Restart,

    /// Shut down for good
    Shutdown,
}

/// Handle to the background reconnection driver
pub struct NotificationClient {
    state_rx: watch::Receiver<ConnectionState>,
    buffer: Arc<Mutex<NotificationBuffer>>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl NotificationClient {
    /// Spawn the driver; returns the handle and the stream of UI alerts
    pub fn connect(config: ClientConfig) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let buffer = Arc::new(Mutex::new(NotificationBuffer::new(config.buffer_capacity)));

        let driver = Driver {
            config,
            state_tx,
            alert_tx,
            buffer: buffer.clone(),
            cmd_rx,
            attempt: 0,
        };
        let task = tokio::spawn(driver.run());

        (
            Self {
                state_rx,
                buffer,
                cmd_tx,
                task,
            },
            alert_rx,
        )
    }

    /// Watch the connection state (drives the UI offline/live indicator)
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Shared local notification buffer
    pub fn buffer(&self) -> Arc<Mutex<NotificationBuffer>> {
        self.buffer.clone()
    }

    /// Restart the reconnect cycle (used after retries are exhausted, e.g.
    /// on user re-login with a fresh token)
    pub fn restart(&self) {
        let _ = self.cmd_tx.send(Command::Restart);
    }

    /// Stop the driver and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

struct Driver {
    config: ClientConfig,
    state_tx: watch::Sender<ConnectionState>,
    alert_tx: mpsc::UnboundedSender<Alert>,
    buffer: Arc<Mutex<NotificationBuffer>>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    attempt: u32,
}

impl Driver {
    fn set_state(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);

            let end = match connect_async(self.config.dial_url()).await {
                Ok((socket, _response)) => {
                    // The upgrade carried the token; acceptance means the
                    // gateway authenticated us and registered the connection.
                    self.set_state(ConnectionState::Authenticated);
                    self.session(socket).await
                }
                Err(e) => {
                    debug!("dial failed: {}", e);
                    SessionEnd::Transport
                }
            };

            self.set_state(ConnectionState::Disconnected);

            match end {
                SessionEnd::Shutdown => return,
                SessionEnd::Restart => {
                    self.attempt = 0;
                    continue;
                }
                SessionEnd::Transport => {}
            }

            self.attempt += 1;
            if self.config.retry.exhausted(self.attempt) {
                warn!(
                    attempts = self.attempt,
                    "reconnect attempts exhausted, waiting for external restart"
                );
                loop {
                    match self.cmd_rx.recv().await {
                        Some(Command::Restart) => {
                            self.attempt = 0;
                            break;
                        }
                        Some(Command::Shutdown) | None => return,
                    }
                }
                continue;
            }

            let delay = self.config.retry.delay(self.attempt);
            debug!(attempt = self.attempt, delay_ms = delay.as_millis() as u64, "backing off");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Restart) => self.attempt = 0,
                    Some(Command::Shutdown) | None => return,
                },
            }
        }
    }

    /// Run one live session until the transport drops or we are told to stop
    async fn session(&mut self, socket: Socket) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();

        let mut keepalive = tokio::time::interval(self.config.keepalive_interval);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        keepalive.tick().await; // consume the immediate first tick

        let mut seq: u64 = 0;
        let mut pending_since: Option<Instant> = None;

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_server_message(&text, &mut pending_since);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("server closed connection");
                        return SessionEnd::Transport;
                    }
                    // Server Ping frames are answered by the transport
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("transport error: {}", e);
                        return SessionEnd::Transport;
                    }
                },
                _ = keepalive.tick() => {
                    if let Some(since) = pending_since {
                        if since.elapsed() >= self.config.ack_timeout {
                            // No ack for the previous keep-alive: tear down
                            // now rather than wait out the transport timeout.
                            warn!("keep-alive unacknowledged, dropping session");
                            return SessionEnd::Transport;
                        }
                    }
                    seq += 1;
                    if let Ok(json) = serde_json::to_string(&ClientMessage::Ping { seq }) {
                        if sink.send(Message::Text(json)).await.is_err() {
                            return SessionEnd::Transport;
                        }
                        if pending_since.is_none() {
                            pending_since = Some(Instant::now());
                        }
                    }
                },
                cmd = self.cmd_rx.recv() => {
                    let end = match cmd {
                        Some(Command::Restart) => SessionEnd::Restart,
                        Some(Command::Shutdown) | None => SessionEnd::Shutdown,
                    };
                    let _ = sink.send(Message::Close(None)).await;
                    return end;
                },
            }
        }
    }

    fn handle_server_message(&mut self, text: &str, pending_since: &mut Option<Instant>) {
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("ignoring unparseable server frame: {}", e);
                return;
            }
        };

        match message {
            ServerMessage::Ready { connection_id } => {
                info!(%connection_id, "session live");
                self.attempt = 0;
                self.set_state(ConnectionState::Connected);
            }
            ServerMessage::Notification { payload, .. } => {
                let alert = Alert::for_payload(&payload);
                if let Ok(mut buffer) = self.buffer.lock() {
                    buffer.push(payload);
                }
                let _ = self.alert_tx.send(alert);
            }
            ServerMessage::Pong { seq } => {
                debug!(seq, "keep-alive acknowledged");
                *pending_since = None;
            }
        }
    }
}
