//! Parsing of the model's terminal JSON reply.

use serde::Serialize;
use serde_json::Value;

use crate::error::AgentError;

/// The accepted final answer of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalAnswer {
    pub answer: Value,
    /// Always present for submission-flow tasks.
    pub submit_url: Option<String>,
}

/// Remove Markdown code fences around a JSON reply.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop an optional language tag on the opening fence line.
        body = match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches("json"),
        };
    }
    body.trim().trim_end_matches("```").trim()
}

/// Parse the terminal reply into a [`FinalAnswer`].
///
/// `answer` is mandatory. When `require_submit_url` is set, a missing, empty or
/// non-string `submit_url` is [`AgentError::MissingSubmissionTarget`].
pub fn parse_final_answer(raw: &str, require_submit_url: bool) -> Result<FinalAnswer, AgentError> {
    let body = strip_code_fences(raw);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AgentError::malformed(format!("invalid JSON: {}", e), raw))?;
    let Value::Object(mut object) = value else {
        return Err(AgentError::malformed("expected a JSON object", raw));
    };

    let answer = object
        .remove("answer")
        .ok_or_else(|| AgentError::malformed("missing \"answer\" key", raw))?;

    let submit_url = match object.remove("submit_url") {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url.trim().to_string()),
        _ => None,
    };

    if require_submit_url && submit_url.is_none() {
        return Err(AgentError::MissingSubmissionTarget);
    }

    Ok(FinalAnswer { answer, submit_url })
}
