//! Relay session protocol and session-lifecycle manager.
//!
//! Maintains one authenticated, reconnecting WebSocket channel to the relay,
//! translates inbound protocol messages into terminal-bridge operations, and
//! keeps the connection, the paired-mobile set, and the live-session set
//! mutually consistent. All state mutation happens on a single dispatch task.

pub mod bridge;
pub mod manager;
pub mod pairing;
pub mod protocol;
pub mod registry;

pub use bridge::{BridgeEvent, TerminalBridge, Workspace, WorkspaceCatalog};
pub use manager::{ConnectionStatus, ManagerConfig, RelayHandle, RelayManager, StatusSnapshot};
pub use pairing::PairingService;
pub use protocol::{Envelope, RelayMessage, WorkspaceSummary};
pub use registry::{MobileConnection, RemoteSession, SessionRegistry};
