//! `POST /solve` - accept a quiz URL and hand it to the background worker.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::error::ApiError;
use super::routes::SolveState;
use super::types::{SolveRequest, SolveResponse};
use crate::task::{Credentials, Task};

/// Validate the secret, enqueue the task and return immediately.
///
/// The agent's outcome is never reported on this connection.
pub async fn solve(
    State(state): State<Arc<SolveState>>,
    Json(req): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, ApiError> {
    if req.secret != state.shared_secret {
        tracing::warn!(email = %req.email, url = %req.url, "Rejected task with invalid secret");
        return Err(ApiError::AuthorizationFailure);
    }

    tracing::info!(email = %req.email, url = %req.url, "Accepted task");
    let task = Task::submission(
        req.url,
        Credentials {
            email: req.email,
            secret: req.secret,
        },
    );
    let task_id = state
        .queue
        .enqueue(task)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SolveResponse::started(task_id)))
}
