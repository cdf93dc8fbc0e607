//! Trait boundaries to the terminal engine and the workspace catalog.
//!
//! The relay manager drives terminals and reads workspaces only through
//! these traits; the real implementations live outside this crate.

use std::path::{Path, PathBuf};

use crate::registry::RemoteSession;

/// A local project directory that can host remote sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub branch: Option<String>,
    pub is_worktree: bool,
    /// Local terminal sessions open in this workspace. Never sent to mobile.
    pub sessions: u32,
}

/// Read-only catalog of local workspaces.
pub trait WorkspaceCatalog: Send + Sync {
    fn list(&self) -> Vec<Workspace>;

    fn get(&self, workspace_id: &str) -> Option<Workspace> {
        self.list().into_iter().find(|w| w.id == workspace_id)
    }
}

/// Events the terminal bridge feeds back into the manager's dispatch task.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Terminal output produced by a session's backing process.
    Output {
        session_id: String,
        owner_id: String,
        data: String,
    },
    /// The backing process exited (or its PTY reached EOF).
    Exit {
        session_id: String,
        owner_id: String,
    },
}

/// The terminal engine behind remote sessions.
///
/// Calls are fire-and-forget from the manager's perspective: none of them
/// may block the dispatch path, and failures are reported through the
/// return value of `create_session` or not at all. Output and exit arrive
/// asynchronously as [`BridgeEvent`]s on the channel handed to the bridge
/// at construction.
pub trait TerminalBridge: Send + Sync {
    /// Create a backing terminal process rooted at `cwd`.
    /// Returns false if the process could not be spawned.
    fn create_session(&self, session: &RemoteSession, cwd: &Path) -> bool;

    /// Write input to a session's terminal.
    fn write(&self, session_id: &str, data: &str);

    /// Resize a session's terminal.
    fn resize(&self, session_id: &str, cols: u16, rows: u16);

    /// Close one session and its backing process.
    fn close_session(&self, session_id: &str);

    /// Close every session owned by a mobile device.
    fn close_sessions_for_owner(&self, owner_id: &str);

    /// Close all sessions.
    fn close_all(&self);

    /// Session ids the bridge currently owns.
    fn session_ids(&self) -> Vec<String>;
}
