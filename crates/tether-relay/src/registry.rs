//! In-memory state for paired mobiles and live remote sessions.
//!
//! Owned exclusively by the relay manager and mutated only from its dispatch
//! task; the single-writer discipline is the synchronization.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// A mobile device currently connected through the relay.
#[derive(Debug, Clone, PartialEq)]
pub struct MobileConnection {
    pub mobile_id: String,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// A terminal session opened on behalf of a mobile device.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSession {
    pub id: String,
    pub mobile_id: String,
    pub workspace_id: String,
    pub workspace_name: String,
    pub created_at: DateTime<Utc>,
}

/// Registry of connected mobiles and active remote sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    mobiles: HashMap<String, MobileConnection>,
    sessions: HashMap<String, RemoteSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly connected mobile. Reconnects refresh the timestamps.
    pub fn add_mobile(&mut self, mobile_id: &str) {
        let now = Utc::now();
        self.mobiles.insert(
            mobile_id.to_string(),
            MobileConnection {
                mobile_id: mobile_id.to_string(),
                connected_at: now,
                last_activity: now,
            },
        );
    }

    pub fn remove_mobile(&mut self, mobile_id: &str) -> Option<MobileConnection> {
        self.mobiles.remove(mobile_id)
    }

    /// Bump `last_activity` for a mobile. Returns false if unknown.
    pub fn touch_mobile(&mut self, mobile_id: &str) -> bool {
        match self.mobiles.get_mut(mobile_id) {
            Some(mobile) => {
                mobile.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn mobile(&self, mobile_id: &str) -> Option<&MobileConnection> {
        self.mobiles.get(mobile_id)
    }

    pub fn add_session(&mut self, session: RemoteSession) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn remove_session(&mut self, session_id: &str) -> Option<RemoteSession> {
        self.sessions.remove(session_id)
    }

    /// Remove every session owned by a mobile. Returns the removed sessions.
    pub fn remove_sessions_for(&mut self, mobile_id: &str) -> Vec<RemoteSession> {
        let ids: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.mobile_id == mobile_id)
            .map(|s| s.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.sessions.remove(id))
            .collect()
    }

    pub fn session(&self, session_id: &str) -> Option<&RemoteSession> {
        self.sessions.get(session_id)
    }

    pub fn mobiles(&self) -> Vec<MobileConnection> {
        self.mobiles.values().cloned().collect()
    }

    pub fn sessions(&self) -> Vec<RemoteSession> {
        self.sessions.values().cloned().collect()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mobiles.is_empty() && self.sessions.is_empty()
    }

    /// Drop all mobiles and sessions.
    pub fn clear(&mut self) {
        self.mobiles.clear();
        self.sessions.clear();
    }
}
