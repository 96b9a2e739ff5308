//! Core types used by the lab session subsystem.

use crate::configuration::types::LabType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked lab session.
///
/// `Running` is the only status ever persisted; sessions that stop or
/// error are removed from the registry and store rather than retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Stopped,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }
}

/// The tracked record of one running lab container for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSession {
    /// Identifier assigned by the container runtime; primary key,
    /// immutable once assigned.
    pub container_id: String,
    /// Owning user, as supplied by the authentication layer.
    pub user_id: String,
    /// Which vulnerability lab this container runs.
    pub lab_type: LabType,
    /// Host port bound to the lab's service port; unique among all
    /// tracked sessions.
    pub port: u16,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl LabSession {
    /// Access URL handed back to the user.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Descriptor returned to the caller after a successful start.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedLab {
    pub container_id: String,
    pub port: u16,
    pub url: String,
}
