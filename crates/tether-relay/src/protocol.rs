//! Wire protocol for the desktop ↔ relay channel.
//!
//! Messages travel as JSON envelopes `{type, payload?, timestamp?}` over the
//! persistent WebSocket. Payload keys are camelCase; that is the relay
//! contract, not a local choice. Parsing is strict: an unknown type or a
//! mismatched payload is a deserialization error, logged and dropped by the
//! dispatcher rather than trusted at runtime.

use serde::{Deserialize, Serialize};

use crate::bridge::Workspace;

/// Every message type the relay channel can carry, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RelayMessage {
    /// First frame the desktop sends after the socket opens.
    #[serde(rename = "register", rename_all = "camelCase")]
    Register {
        device_id: String,
        device_name: String,
    },

    /// Relay acknowledgment of `register`.
    #[serde(rename = "registered")]
    Registered,

    #[serde(rename = "mobile_connected", rename_all = "camelCase")]
    MobileConnected { mobile_id: String },

    #[serde(rename = "mobile_disconnect", rename_all = "camelCase")]
    MobileDisconnect { mobile_id: String },

    /// Mobile asks for the workspace catalog, forwarded by the relay.
    #[serde(rename = "workspace_list", rename_all = "camelCase")]
    WorkspaceList { request_from: String },

    /// Reply to `workspace_list`, routed to `to`.
    #[serde(rename = "workspace_data", rename_all = "camelCase")]
    WorkspaceData {
        workspaces: Vec<WorkspaceSummary>,
        to: String,
    },

    #[serde(rename = "session_create", rename_all = "camelCase")]
    SessionCreate {
        workspace_id: String,
        name: String,
        request_from: String,
    },

    #[serde(rename = "session_created", rename_all = "camelCase")]
    SessionCreated {
        session_id: String,
        name: String,
        to: String,
    },

    /// Travels both directions: mobiles request a close, and the desktop
    /// announces one when the backing process exits.
    #[serde(rename = "session_close", rename_all = "camelCase")]
    SessionClose {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },

    #[serde(rename = "terminal_input", rename_all = "camelCase")]
    TerminalInput {
        session_id: String,
        data: String,
        from: String,
    },

    #[serde(rename = "terminal_output", rename_all = "camelCase")]
    TerminalOutput {
        session_id: String,
        to: String,
        data: String,
    },

    #[serde(rename = "terminal_resize", rename_all = "camelCase")]
    TerminalResize {
        session_id: String,
        cols: u16,
        rows: u16,
    },

    #[serde(rename = "ping")]
    Ping,

    #[serde(rename = "pong")]
    Pong,

    #[serde(rename = "error")]
    Error { message: String },
}

impl RelayMessage {
    /// Wire name of this message type, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            RelayMessage::Register { .. } => "register",
            RelayMessage::Registered => "registered",
            RelayMessage::MobileConnected { .. } => "mobile_connected",
            RelayMessage::MobileDisconnect { .. } => "mobile_disconnect",
            RelayMessage::WorkspaceList { .. } => "workspace_list",
            RelayMessage::WorkspaceData { .. } => "workspace_data",
            RelayMessage::SessionCreate { .. } => "session_create",
            RelayMessage::SessionCreated { .. } => "session_created",
            RelayMessage::SessionClose { .. } => "session_close",
            RelayMessage::TerminalInput { .. } => "terminal_input",
            RelayMessage::TerminalOutput { .. } => "terminal_output",
            RelayMessage::TerminalResize { .. } => "terminal_resize",
            RelayMessage::Ping => "ping",
            RelayMessage::Pong => "pong",
            RelayMessage::Error { .. } => "error",
        }
    }
}

/// Mobile-safe projection of a workspace: no session data, no local-only
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub is_worktree: bool,
}

impl From<&Workspace> for WorkspaceSummary {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.id.clone(),
            name: workspace.name.clone(),
            path: workspace.path.display().to_string(),
            branch: workspace.branch.clone(),
            is_worktree: workspace.is_worktree,
        }
    }
}

/// Envelope around a [`RelayMessage`] adding the send-time timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub message: RelayMessage,
    /// Epoch milliseconds, stamped at send time on outbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Envelope {
    /// Wrap a message and stamp it with the current time.
    pub fn stamped(message: RelayMessage) -> Self {
        Self {
            message,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Parse an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
