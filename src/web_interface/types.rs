//! JSON payloads of the lab HTTP API.

use crate::lab_management::types::LabSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/labs/start`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLabRequest {
    /// Requested lab type as a wire string; validated against the closed
    /// [`crate::configuration::types::LabType`] set before anything else
    /// happens.
    pub lab_type: String,
}

/// Body of `POST /api/labs/stop`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopLabRequest {
    /// Specific container to stop; omitted means "all of mine".
    #[serde(default)]
    pub container_id: Option<String>,
}

/// API error payload
#[derive(Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLabData {
    pub container_id: String,
    pub port: u16,
    pub url: String,
    pub lab_type: String,
}

#[derive(Serialize)]
pub struct StartLabResponse {
    pub success: bool,
    pub message: String,
    pub data: StartLabData,
}

#[derive(Serialize)]
pub struct StopLabResponse {
    pub success: bool,
    pub message: String,
}

/// One active container as reported by `GET /api/labs/status`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    pub container_id: String,
    pub lab_type: String,
    pub port: u16,
    pub url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&LabSession> for ContainerStatus {
    fn from(session: &LabSession) -> Self {
        Self {
            container_id: session.container_id.clone(),
            lab_type: session.lab_type.to_string(),
            port: session.port,
            url: session.url(),
            status: session.status.as_str().to_string(),
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub active_containers: Vec<ContainerStatus>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub data: StatusData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub docker_available: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub data: HealthData,
}
