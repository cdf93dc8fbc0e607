//! The relay connection and session-lifecycle manager.
//!
//! One tokio task owns all mutable state (connection handle, registry,
//! timers) and consumes a single event stream: commands from the public
//! handle, inbound relay frames, transport-close notifications, keepalive
//! and reconnect ticks, and terminal-bridge events. Nothing mutates state
//! outside that task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use tether_common::id::{IdSource, UuidIds};
use tether_config::RelaySettings;
use tether_device::DeviceIdentity;

use crate::bridge::{BridgeEvent, TerminalBridge, WorkspaceCatalog};
use crate::protocol::{Envelope, RelayMessage, WorkspaceSummary};
use crate::registry::{MobileConnection, RemoteSession, SessionRegistry};

/// Connection status. Exactly one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Snapshot pushed to local UI surfaces whenever the status, the mobile
/// set, or the session set changes.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    pub device_id: String,
    pub device_name: String,
    pub connected_mobiles: Vec<MobileConnection>,
    pub active_sessions: Vec<RemoteSession>,
}

/// Manager construction parameters.
///
/// The intervals default to production values; tests compress them.
pub struct ManagerConfig {
    pub settings: RelaySettings,
    pub identity: DeviceIdentity,
    pub keepalive_interval: Duration,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    /// Source of session ids; injectable for deterministic tests.
    pub ids: Arc<dyn IdSource>,
}

impl ManagerConfig {
    pub fn new(settings: RelaySettings, identity: DeviceIdentity) -> Self {
        Self {
            settings,
            identity,
            keepalive_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            ids: Arc::new(UuidIds),
        }
    }
}

/// Commands from the public handle into the dispatch task.
enum Command {
    Connect { reply: oneshot::Sender<bool> },
    Disconnect,
    UpdateSettings(RelaySettings),
    Snapshot { reply: oneshot::Sender<StatusSnapshot> },
    Shutdown,
}

/// Internal events from the transport tasks and timers.
///
/// Transport events carry the connection generation they belong to, so a
/// frame queued by an already-torn-down reader can never mutate the state
/// of a newer connection.
enum Event {
    Inbound { generation: u64, text: String },
    TransportClosed { generation: u64, reason: String },
    KeepaliveTick,
    ReconnectTick,
}

/// Cloneable handle to a spawned [`RelayManager`].
#[derive(Clone)]
pub struct RelayHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_tx: broadcast::Sender<StatusSnapshot>,
}

impl RelayHandle {
    /// Connect to the relay. Resolves with the outcome of the initial
    /// attempt; true if already connected.
    pub async fn connect(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Connect { reply }).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Disconnect from the relay. Idempotent, safe in any state.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Apply new relay settings, driving connect/disconnect side effects.
    pub fn update_settings(&self, settings: RelaySettings) {
        let _ = self.cmd_tx.send(Command::UpdateSettings(settings));
    }

    /// Current status snapshot, or `None` if the manager has shut down.
    pub async fn snapshot(&self) -> Option<StatusSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Snapshot { reply }).ok()?;
        rx.await.ok()
    }

    /// Subscribe to status snapshots.
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.status_tx.subscribe()
    }

    /// Stop the manager, closing the connection and all sessions.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

/// Live transport to the relay: the outbound frame channel plus abort
/// handles for the reader/writer tasks.
struct Transport {
    outbound_tx: mpsc::UnboundedSender<String>,
    reader: AbortHandle,
    writer: AbortHandle,
}

/// The connection manager. Constructed and driven via [`RelayManager::spawn`].
pub struct RelayManager {
    config: ManagerConfig,
    catalog: Arc<dyn WorkspaceCatalog>,
    bridge: Arc<dyn TerminalBridge>,
    registry: SessionRegistry,
    status: ConnectionStatus,
    transport: Option<Transport>,
    keepalive: Option<AbortHandle>,
    reconnect: Option<AbortHandle>,
    /// Bumped on every connect/teardown; stale transport events are dropped.
    generation: u64,
    event_tx: mpsc::UnboundedSender<Event>,
    status_tx: broadcast::Sender<StatusSnapshot>,
}

impl RelayManager {
    /// Spawn the manager's dispatch task and return a handle to it.
    ///
    /// `bridge_rx` is the receiving end of the channel the terminal bridge
    /// emits its output/exit events on.
    pub fn spawn(
        config: ManagerConfig,
        catalog: Arc<dyn WorkspaceCatalog>,
        bridge: Arc<dyn TerminalBridge>,
        bridge_rx: mpsc::UnboundedReceiver<BridgeEvent>,
    ) -> RelayHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = broadcast::channel(64);

        let manager = Self {
            config,
            catalog,
            bridge,
            registry: SessionRegistry::new(),
            status: ConnectionStatus::Disconnected,
            transport: None,
            keepalive: None,
            reconnect: None,
            generation: 0,
            event_tx,
            status_tx: status_tx.clone(),
        };

        tokio::spawn(manager.run(cmd_rx, event_rx, bridge_rx));

        RelayHandle { cmd_tx, status_tx }
    }

    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut event_rx: mpsc::UnboundedReceiver<Event>,
        mut bridge_rx: mpsc::UnboundedReceiver<BridgeEvent>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Connect { reply }) => {
                        let connected = self.connect().await;
                        let _ = reply.send(connected);
                    }
                    Some(Command::Disconnect) => self.disconnect(),
                    Some(Command::UpdateSettings(settings)) => {
                        self.apply_settings(settings).await;
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(Command::Shutdown) | None => {
                        self.disconnect();
                        break;
                    }
                },
                Some(event) = event_rx.recv() => self.handle_event(event).await,
                Some(event) = bridge_rx.recv() => self.handle_bridge_event(event),
            }
        }
        debug!("relay manager stopped");
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Inbound { generation, text } => {
                if generation == self.generation {
                    self.handle_inbound(&text);
                }
            }
            Event::TransportClosed { generation, reason } => {
                if generation == self.generation {
                    self.handle_transport_closed(&reason);
                }
            }
            Event::KeepaliveTick => {
                if self.status == ConnectionStatus::Connected {
                    self.send(RelayMessage::Ping);
                }
            }
            Event::ReconnectTick => self.handle_reconnect_tick().await,
        }
    }

    // =========================================================================
    // CONNECTION LIFECYCLE
    // =========================================================================

    async fn connect(&mut self) -> bool {
        if self.status == ConnectionStatus::Connected {
            return true;
        }
        self.set_status(ConnectionStatus::Connecting);

        let url = format!(
            "{}/connect/{}?type=desktop",
            self.config.settings.relay_url.trim_end_matches('/'),
            self.config.identity.device_id,
        );

        let ws = match tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(&url),
        )
        .await
        {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                warn!(error = %e, url = %url, "relay connect failed");
                self.set_status(ConnectionStatus::Error);
                return false;
            }
            Err(_) => {
                warn!(url = %url, "relay connect timed out");
                self.set_status(ConnectionStatus::Error);
                return false;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let (mut sink, mut stream) = ws.split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        });

        let event_tx = self.event_tx.clone();
        let reader = tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let event = Event::Inbound {
                            generation,
                            text: text.to_string(),
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = event_tx.send(Event::TransportClosed {
                            generation,
                            reason: "connection closed".into(),
                        });
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = event_tx.send(Event::TransportClosed {
                            generation,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }
        });

        self.transport = Some(Transport {
            outbound_tx,
            reader: reader.abort_handle(),
            writer: writer.abort_handle(),
        });

        // The register handshake is always the first outbound frame.
        self.send(RelayMessage::Register {
            device_id: self.config.identity.device_id.clone(),
            device_name: self.config.identity.device_name.clone(),
        });

        self.set_status(ConnectionStatus::Connected);
        self.start_keepalive();
        info!(
            url = %url,
            device_id = %self.config.identity.device_id,
            "connected to relay"
        );
        true
    }

    /// Tear everything down. Idempotent; safe in any state.
    fn disconnect(&mut self) {
        self.cancel_reconnect();
        self.stop_keepalive();

        if let Some(transport) = self.transport.take() {
            transport.reader.abort();
            transport.writer.abort();
        }
        self.generation += 1;

        let had_state = !self.registry.is_empty();
        self.bridge.close_all();
        self.registry.clear();

        if self.status != ConnectionStatus::Disconnected {
            self.set_status(ConnectionStatus::Disconnected);
        } else if had_state {
            self.broadcast_status();
        }
    }

    fn handle_transport_closed(&mut self, reason: &str) {
        warn!(reason = %reason, "relay connection lost");

        self.stop_keepalive();
        if let Some(transport) = self.transport.take() {
            transport.reader.abort();
            transport.writer.abort();
        }
        self.generation += 1;

        // The relay can no longer route to any mobile: drop the mobiles and
        // their sessions. They re-announce after the next register.
        self.bridge.close_all();
        self.registry.clear();
        self.set_status(ConnectionStatus::Disconnected);

        if self.config.settings.enabled && self.config.settings.auto_connect {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        // At most one pending reconnect at a time.
        if self.reconnect.is_some() {
            return;
        }
        let delay = self.config.reconnect_delay;
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(Event::ReconnectTick);
        });
        self.reconnect = Some(task.abort_handle());
        info!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
    }

    async fn handle_reconnect_tick(&mut self) {
        // A tick with no armed timer was cancelled after firing; ignore it.
        if self.reconnect.take().is_none() {
            return;
        }
        if self.status == ConnectionStatus::Connected || self.status == ConnectionStatus::Connecting
        {
            return;
        }
        if !(self.config.settings.enabled && self.config.settings.auto_connect) {
            return;
        }
        if !self.connect().await {
            // The attempt failed before open; keep trying on the same cadence.
            self.schedule_reconnect();
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.reconnect.take() {
            handle.abort();
        }
    }

    fn start_keepalive(&mut self) {
        self.stop_keepalive();
        let interval = self.config.keepalive_interval;
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await; // the first tick completes immediately
            loop {
                timer.tick().await;
                if event_tx.send(Event::KeepaliveTick).is_err() {
                    break;
                }
            }
        });
        self.keepalive = Some(task.abort_handle());
    }

    fn stop_keepalive(&mut self) {
        if let Some(handle) = self.keepalive.take() {
            handle.abort();
        }
    }

    // =========================================================================
    // INBOUND DISPATCH
    // =========================================================================

    fn handle_inbound(&mut self, text: &str) {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping malformed relay message");
                return;
            }
        };

        match envelope.message {
            RelayMessage::Registered => {
                info!(device_id = %self.config.identity.device_id, "registered with relay");
                self.broadcast_status();
            }
            RelayMessage::MobileConnected { mobile_id } => {
                info!(mobile_id = %mobile_id, "mobile connected");
                self.registry.add_mobile(&mobile_id);
                self.broadcast_status();
            }
            RelayMessage::MobileDisconnect { mobile_id } => {
                info!(mobile_id = %mobile_id, "mobile disconnected");
                self.bridge.close_sessions_for_owner(&mobile_id);
                let removed = self.registry.remove_sessions_for(&mobile_id);
                if !removed.is_empty() {
                    debug!(
                        mobile_id = %mobile_id,
                        count = removed.len(),
                        "closed sessions for disconnected mobile"
                    );
                }
                self.registry.remove_mobile(&mobile_id);
                self.broadcast_status();
            }
            RelayMessage::WorkspaceList { request_from } => {
                let workspaces: Vec<WorkspaceSummary> = self
                    .catalog
                    .list()
                    .iter()
                    .map(WorkspaceSummary::from)
                    .collect();
                debug!(
                    to = %request_from,
                    count = workspaces.len(),
                    "sending workspace list"
                );
                self.send(RelayMessage::WorkspaceData {
                    workspaces,
                    to: request_from,
                });
            }
            RelayMessage::SessionCreate {
                workspace_id,
                name,
                request_from,
            } => self.handle_session_create(workspace_id, name, request_from),
            RelayMessage::SessionClose { session_id, .. } => {
                self.bridge.close_session(&session_id);
                if self.registry.remove_session(&session_id).is_some() {
                    info!(session_id = %session_id, "remote session closed");
                    self.broadcast_status();
                }
            }
            RelayMessage::TerminalInput {
                session_id,
                data,
                from,
            } => {
                if self.registry.session(&session_id).is_some() {
                    self.bridge.write(&session_id, &data);
                } else {
                    debug!(session_id = %session_id, "input for unknown session dropped");
                }
                self.registry.touch_mobile(&from);
            }
            RelayMessage::TerminalResize {
                session_id,
                cols,
                rows,
            } => {
                if self.registry.session(&session_id).is_some() {
                    self.bridge.resize(&session_id, cols, rows);
                } else {
                    debug!(session_id = %session_id, "resize for unknown session dropped");
                }
            }
            RelayMessage::Pong => {}
            RelayMessage::Error { message } => {
                warn!(message = %message, "relay reported an error");
            }
            other => {
                debug!(
                    message_type = other.type_name(),
                    "ignoring unexpected inbound message"
                );
            }
        }
    }

    fn handle_session_create(&mut self, workspace_id: String, name: String, request_from: String) {
        let Some(workspace) = self.catalog.get(&workspace_id) else {
            // Known gap in the relay contract: the mobile gets no error reply.
            warn!(
                workspace_id = %workspace_id,
                request_from = %request_from,
                "session_create for unknown workspace, dropping"
            );
            return;
        };

        let session = RemoteSession {
            id: self.config.ids.next_id(),
            mobile_id: request_from.clone(),
            workspace_id,
            workspace_name: workspace.name.clone(),
            created_at: Utc::now(),
        };

        if !self.bridge.create_session(&session, &workspace.path) {
            warn!(
                session_id = %session.id,
                workspace = %workspace.name,
                "terminal bridge failed to create session"
            );
            return;
        }

        info!(
            session_id = %session.id,
            mobile_id = %request_from,
            workspace = %workspace.name,
            "remote session created"
        );
        self.send(RelayMessage::SessionCreated {
            session_id: session.id.clone(),
            name,
            to: request_from,
        });
        self.registry.add_session(session);
        self.broadcast_status();
    }

    // =========================================================================
    // BRIDGE EVENTS
    // =========================================================================

    fn handle_bridge_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Output {
                session_id,
                owner_id,
                data,
            } => {
                self.send(RelayMessage::TerminalOutput {
                    session_id,
                    to: owner_id,
                    data,
                });
            }
            BridgeEvent::Exit {
                session_id,
                owner_id,
            } => {
                let removed = self.registry.remove_session(&session_id).is_some();
                info!(session_id = %session_id, owner_id = %owner_id, "session process exited");
                // Attempted even if the owner already disconnected; the relay
                // drops unroutable messages.
                self.send(RelayMessage::SessionClose {
                    session_id,
                    request_from: None,
                    to: Some(owner_id),
                });
                if removed {
                    self.broadcast_status();
                }
            }
        }
    }

    // =========================================================================
    // SETTINGS & STATUS
    // =========================================================================

    async fn apply_settings(&mut self, settings: RelaySettings) {
        let previous = std::mem::replace(&mut self.config.settings, settings);
        let current = &self.config.settings;

        if current.enabled && !previous.enabled {
            if self.status != ConnectionStatus::Connected
                && self.status != ConnectionStatus::Connecting
            {
                let _ = self.connect().await;
            }
        } else if !current.enabled && previous.enabled {
            if self.status != ConnectionStatus::Disconnected {
                self.disconnect();
            }
        }
        // relay_url / auto_connect changes alone take effect on the next
        // connect or close.
    }

    fn send(&mut self, message: RelayMessage) {
        let Some(transport) = &self.transport else {
            debug!(
                message_type = message.type_name(),
                "dropping outbound message, not connected"
            );
            return;
        };
        let json = Envelope::stamped(message).to_json();
        if transport.outbound_tx.send(json).is_err() {
            debug!("outbound channel closed");
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            device_id: self.config.identity.device_id.clone(),
            device_name: self.config.identity.device_name.clone(),
            connected_mobiles: self.registry.mobiles(),
            active_sessions: self.registry.sessions(),
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            self.broadcast_status();
        }
    }

    fn broadcast_status(&self) {
        let _ = self.status_tx.send(self.snapshot());
    }
}
