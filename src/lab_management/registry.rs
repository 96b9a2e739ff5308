//! In-memory session registry.
//!
//! The registry is the authoritative view of active sessions during
//! process lifetime; the durable store trails it and the two are brought
//! back in sync by startup reconciliation. Synchronization lives in the
//! manager — this structure is plain single-threaded bookkeeping.

use crate::lab_management::types::LabSession;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, LabSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session, replacing any previous entry for the same
    /// container id.
    pub fn insert(&mut self, session: LabSession) {
        self.sessions.insert(session.container_id.clone(), session);
    }

    pub fn remove(&mut self, container_id: &str) -> Option<LabSession> {
        self.sessions.remove(container_id)
    }

    pub fn get(&self, container_id: &str) -> Option<&LabSession> {
        self.sessions.get(container_id)
    }

    /// Sessions owned by `user_id`, oldest first.
    pub fn sessions_for_user(&self, user_id: &str) -> Vec<LabSession> {
        let mut sessions: Vec<LabSession> = self
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sessions
    }

    /// All tracked sessions, oldest first.
    pub fn all_sessions(&self) -> Vec<LabSession> {
        let mut sessions: Vec<LabSession> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.container_id.cmp(&b.container_id))
        });
        sessions
    }

    /// Host ports currently held by tracked sessions.
    pub fn ports_in_use(&self) -> HashSet<u16> {
        self.sessions.values().map(|s| s.port).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
