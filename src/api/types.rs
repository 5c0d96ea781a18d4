//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /solve`.
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub email: String,
    pub secret: String,
    /// Quiz page the agent should solve.
    pub url: String,
}

/// Immediate acknowledgement of an accepted task.
#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    pub message: String,
    pub status: String,
    pub task_id: Uuid,
}

impl SolveResponse {
    pub fn started(task_id: Uuid) -> Self {
        Self {
            message: "Agent started".to_string(),
            status: "ok".to_string(),
            task_id,
        }
    }
}

/// Body returned by `POST /api`.
#[derive(Debug, Clone, Serialize)]
pub struct QaResponse {
    pub answer: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
