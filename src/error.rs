//! Error taxonomy shared by the agent loop and the tool registry.

use thiserror::Error;

/// Failures raised while dispatching a tool call.
///
/// The agent loop never aborts on these: they are rendered into the tool
/// result so the model can see what went wrong and adjust.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    Argument { tool: String, reason: String },

    #[error("{tool} failed: {source:#}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ToolError {
    pub fn argument(tool: &str, reason: impl Into<String>) -> Self {
        Self::Argument {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    pub fn execution(tool: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::Execution {
            tool: tool.to_string(),
            source: source.into(),
        }
    }
}

/// Failures that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed agent response: {reason}")]
    MalformedAgentResponse { reason: String, raw: String },

    #[error("Agent response has no submit_url")]
    MissingSubmissionTarget,

    #[error("Max iterations ({0}) reached without a final answer")]
    LoopBudgetExceeded(usize),
}

impl AgentError {
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedAgentResponse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}
