//! Submission sink: POST the final answer to the model-supplied target.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::AgentError;
use crate::task::Credentials;

/// Body of the submission POST.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub secret: String,
    pub url: String,
    pub answer: Value,
}

impl SubmissionPayload {
    pub fn new(credentials: &Credentials, task_url: &str, answer: Value) -> Self {
        Self {
            email: credentials.email.clone(),
            secret: credentials.secret.clone(),
            url: task_url.to_string(),
            answer,
        }
    }
}

/// Issues exactly one POST per submission; never retries.
pub struct Submitter {
    http: reqwest::Client,
}

impl Submitter {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// POST `payload` to `target`, returning the response body on 2xx.
    pub async fn submit(&self, target: &str, payload: &SubmissionPayload) -> Result<String, AgentError> {
        tracing::info!(target, url = %payload.url, answer = %payload.answer, "Submitting answer");

        let resp = self
            .http
            .post(target)
            .json(payload)
            .send()
            .await
            .map_err(|e| AgentError::UpstreamUnavailable(format!("submission failed: {}", e)))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::info!(target, %status, body = %truncate(&body, 500), "Submission response");

        if !status.is_success() {
            return Err(AgentError::UpstreamUnavailable(format!(
                "submission rejected ({}): {}",
                status,
                truncate(&body, 500)
            )));
        }
        Ok(body)
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
