//! Configuration schema types for tether.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Well-known default relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "wss://relay.tether.dev";

/// Relay connection settings.
///
/// Flipping `enabled` at runtime drives connect/disconnect side effects in
/// the relay manager; `relay_url` and `auto_connect` changes alone do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Whether the relay bridge is active at all.
    pub enabled: bool,
    /// WebSocket relay endpoint (`ws://` or `wss://`).
    pub relay_url: String,
    /// Reconnect automatically after an unexpected connection loss.
    pub auto_connect: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            relay_url: DEFAULT_RELAY_URL.into(),
            auto_connect: true,
        }
    }
}

/// A project directory exposed to mobile clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub relay: RelaySettings,
    /// Workspaces offered in `workspace_list` replies.
    #[serde(rename = "workspace")]
    pub workspaces: Vec<WorkspaceEntry>,
}
