//! The `TerminalBridge` implementation over portable-pty.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use portable_pty::{Child, MasterPty, PtySize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tether_relay::{BridgeEvent, RemoteSession, TerminalBridge};

use crate::spawn::{spawn_pty, PtyHandle, DEFAULT_COLS, DEFAULT_ROWS, PTY_READ_CHUNK};

/// A live PTY session and its owning mobile device.
///
/// The reader half lives on the session's background thread, not here.
struct PtySession {
    owner_id: String,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    master: Box<dyn MasterPty + Send>,
}

/// Terminal bridge backed by real PTYs, one per remote session.
///
/// Output and exit are pushed as [`BridgeEvent`]s on the channel supplied at
/// construction; the relay manager consumes them on its dispatch task.
pub struct PtyBridge {
    sessions: Arc<Mutex<HashMap<String, PtySession>>>,
    events: mpsc::UnboundedSender<BridgeEvent>,
}

impl PtyBridge {
    pub fn new(events: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Remove a session and kill its backing process.
    ///
    /// Removing the handle first is what suppresses the reader thread's exit
    /// event for explicitly closed sessions: on EOF the reader only reports
    /// an exit if the session is still registered.
    fn kill_session(&self, session_id: &str) {
        let removed = self.sessions.lock().unwrap().remove(session_id);
        if let Some(mut session) = removed {
            if let Err(e) = session.child.kill() {
                debug!(session_id, "PTY kill error (may already be dead): {e}");
            }
            let _ = session.child.wait();
            info!(session_id, "terminal session closed");
        }
    }
}

impl TerminalBridge for PtyBridge {
    fn create_session(&self, session: &RemoteSession, cwd: &Path) -> bool {
        let PtyHandle {
            writer,
            mut reader,
            child,
            master,
        } = match spawn_pty(DEFAULT_COLS, DEFAULT_ROWS, cwd) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    cwd = %cwd.display(),
                    error = %e,
                    "failed to spawn PTY"
                );
                return false;
            }
        };

        self.sessions.lock().unwrap().insert(
            session.id.clone(),
            PtySession {
                owner_id: session.mobile_id.clone(),
                writer,
                child,
                master,
            },
        );

        let session_id = session.id.clone();
        let owner_id = session.mobile_id.clone();
        let sessions = self.sessions.clone();
        let events = self.events.clone();

        let spawned = thread::Builder::new()
            .name(format!("pty-reader-{session_id}"))
            .spawn(move || {
                let mut buf = [0u8; PTY_READ_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break, // EOF — shell exited
                        Ok(n) => {
                            let data = String::from_utf8_lossy(&buf[..n]).to_string();
                            let event = BridgeEvent::Output {
                                session_id: session_id.clone(),
                                owner_id: owner_id.clone(),
                                data,
                            };
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!(session_id = %session_id, "PTY reader error: {e}");
                            break;
                        }
                    }
                }

                // Only report an exit if the session wasn't explicitly closed.
                let still_registered = sessions.lock().unwrap().remove(&session_id);
                if let Some(mut session) = still_registered {
                    let _ = session.child.wait();
                    let _ = events.send(BridgeEvent::Exit {
                        session_id,
                        owner_id,
                    });
                }
            });

        match spawned {
            Ok(_) => {
                info!(session_id = %session.id, cwd = %cwd.display(), "terminal session created");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to spawn PTY reader thread");
                self.kill_session(&session.id);
                false
            }
        }
    }

    fn write(&self, session_id: &str, data: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            Some(session) => {
                if let Err(e) = session
                    .writer
                    .write_all(data.as_bytes())
                    .and_then(|_| session.writer.flush())
                {
                    warn!(session_id, "PTY write failed: {e}");
                }
            }
            None => debug!(session_id, "write to unknown session ignored"),
        }
    }

    fn resize(&self, session_id: &str, cols: u16, rows: u16) {
        let sessions = self.sessions.lock().unwrap();
        match sessions.get(session_id) {
            Some(session) => {
                let size = PtySize {
                    rows,
                    cols,
                    pixel_width: 0,
                    pixel_height: 0,
                };
                if let Err(e) = session.master.resize(size) {
                    warn!(session_id, "PTY resize failed: {e}");
                }
            }
            None => debug!(session_id, "resize for unknown session ignored"),
        }
    }

    fn close_session(&self, session_id: &str) {
        self.kill_session(session_id);
    }

    fn close_sessions_for_owner(&self, owner_id: &str) {
        let ids: Vec<String> = {
            let sessions = self.sessions.lock().unwrap();
            sessions
                .iter()
                .filter(|(_, s)| s.owner_id == owner_id)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for id in ids {
            self.kill_session(&id);
        }
    }

    fn close_all(&self) {
        let ids: Vec<String> = self.sessions.lock().unwrap().keys().cloned().collect();
        let count = ids.len();
        for id in ids {
            self.kill_session(&id);
        }
        if count > 0 {
            info!(count, "all terminal sessions closed");
        }
    }

    fn session_ids(&self) -> Vec<String> {
        self.sessions.lock().unwrap().keys().cloned().collect()
    }
}
