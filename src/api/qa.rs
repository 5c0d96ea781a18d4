//! `POST /api` - synchronous question answering with an optional upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;

use super::error::ApiError;
use super::routes::QaState;
use super::types::QaResponse;
use crate::tools::unique_file_name;

pub async fn answer_question(
    State(state): State<Arc<QaState>>,
    mut multipart: Multipart,
) -> Result<Json<QaResponse>, ApiError> {
    let mut question: Option<String> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("question") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid question field: {}", e)))?;
                question = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid file field: {}", e)))?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    upload = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    let question = question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("question is required".to_string()))?;

    let question = match upload {
        Some((file_name, bytes)) => {
            let saved = persist_upload(&state.upload_dir, &file_name, &bytes)
                .await
                .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;
            tracing::info!(path = %saved.display(), size = bytes.len(), "Stored upload");
            question_with_attachment(&question, &saved)
        }
        None => question,
    };

    let answer = state
        .answerer
        .answer(&question)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(QaResponse { answer }))
}

/// Write an uploaded file under `dir` with a collision-resistant name.
pub async fn persist_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(unique_file_name(file_name));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Tell the model where the attachment lives.
pub fn question_with_attachment(question: &str, saved: &Path) -> String {
    format!("{} (File saved to {})", question, saved.display())
}
