//! Core agent loop implementation.

use std::fmt;
use std::sync::Arc;

use crate::error::{AgentError, ToolError};
use crate::fetcher::{PageContent, PageFetcher};
use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::task::{Task, TaskSource};
use crate::tools::ToolRegistry;

use super::answer::{parse_final_answer, FinalAnswer};
use super::prompt::{build_task_prompt, correction_prompt};

/// Terminal state of one run.
pub type AgentOutcome = Result<FinalAnswer, AgentError>;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Start,
    ContextGathered,
    AwaitingModel,
    ToolDispatch,
    TerminalSuccess,
    TerminalFailure,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Start => "START",
            LoopState::ContextGathered => "CONTEXT_GATHERED",
            LoopState::AwaitingModel => "AWAITING_MODEL",
            LoopState::ToolDispatch => "TOOL_DISPATCH",
            LoopState::TerminalSuccess => "TERMINAL_SUCCESS",
            LoopState::TerminalFailure => "TERMINAL_FAILURE",
        };
        f.write_str(name)
    }
}

/// Loop limits.
#[derive(Debug, Clone, Copy)]
pub struct AgentLimits {
    /// Model round-trips allowed per run
    pub max_iterations: usize,

    /// Unusable final replies that are sent back for correction
    pub correction_retries: usize,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            correction_retries: 0,
        }
    }
}

/// The multi-turn tool-calling agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    limits: AgentLimits,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        fetcher: Arc<dyn PageFetcher>,
        limits: AgentLimits,
    ) -> Self {
        Self {
            llm,
            tools,
            fetcher,
            limits,
        }
    }

    /// Run `task` to its terminal state.
    ///
    /// Tool failures are fed back to the model as text; only gateway failures,
    /// unusable final replies and budget exhaustion end the run early.
    pub async fn run(&self, task: &Task) -> AgentOutcome {
        let outcome = self.run_inner(task).await;
        match &outcome {
            Ok(answer) => {
                tracing::info!(task_id = %task.id(), state = %LoopState::TerminalSuccess, answer = %answer.answer, "Agent finished")
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id(), state = %LoopState::TerminalFailure, error = %e, "Agent failed")
            }
        }
        outcome
    }

    async fn run_inner(&self, task: &Task) -> AgentOutcome {
        let task_id = task.id();
        let require_submit_url = task.requires_submission();
        tracing::debug!(%task_id, state = %LoopState::Start, "Starting agent run");

        let page = self.gather_context(task).await;
        tracing::debug!(
            %task_id,
            state = %LoopState::ContextGathered,
            chars = page.text.len(),
            links = page.links.len(),
            "Context gathered"
        );

        let mut messages = vec![ChatMessage::user(build_task_prompt(
            &page,
            &self.tools,
            require_submit_url,
        ))];
        let tool_schemas = self.tools.schemas();
        let mut corrections_left = self.limits.correction_retries;

        for iteration in 0..self.limits.max_iterations {
            tracing::debug!(%task_id, state = %LoopState::AwaitingModel, iteration = iteration + 1, "Agent iteration");

            let response = self
                .llm
                .chat_completion(&messages, Some(&tool_schemas))
                .await?;

            if let Some(tool_calls) = response.requested_tools() {
                let tool_calls = tool_calls.to_vec();
                messages.push(ChatMessage::assistant(
                    response.content.clone(),
                    Some(tool_calls.clone()),
                ));

                tracing::debug!(%task_id, state = %LoopState::ToolDispatch, calls = tool_calls.len(), "Dispatching tools");
                for tool_call in &tool_calls {
                    let result = self.execute_tool_call(tool_call).await;
                    messages.push(ChatMessage::tool_result(&tool_call.id, result));
                }
                continue;
            }

            let raw = response.content.clone().unwrap_or_default();
            match self.finish(&raw, require_submit_url) {
                Ok(answer) => return Ok(answer),
                Err(e) if corrections_left > 0 => {
                    corrections_left -= 1;
                    tracing::info!(%task_id, error = %e, "Asking the model to correct its final reply");
                    messages.push(ChatMessage::assistant(Some(raw), None));
                    messages.push(ChatMessage::user(correction_prompt(
                        &e.to_string(),
                        require_submit_url,
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        Err(AgentError::LoopBudgetExceeded(self.limits.max_iterations))
    }

    async fn gather_context(&self, task: &Task) -> PageContent {
        match task.source() {
            TaskSource::Url(url) => self.fetcher.fetch(url).await,
            TaskSource::Question(text) => PageContent {
                text: text.clone(),
                links: Vec::new(),
            },
        }
    }

    fn finish(&self, raw: &str, require_submit_url: bool) -> AgentOutcome {
        if raw.trim().is_empty() {
            return Err(AgentError::malformed("LLM returned empty response", raw));
        }
        parse_final_answer(raw, require_submit_url)
    }

    /// Execute a single tool call, rendering any failure as text for the model.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> String {
        let name = &tool_call.function.name;
        tracing::info!(
            tool = %name,
            args = %truncate_for_log(&tool_call.function.arguments, 500),
            "Agent calling tool"
        );

        let result = match tool_call.parsed_arguments() {
            Ok(args) => self.tools.dispatch(name, args).await,
            Err(e) => Err(ToolError::argument(name, format!("arguments are not valid JSON: {}", e))),
        };

        match result {
            Ok(output) => {
                tracing::debug!(tool = %name, result = %truncate_for_log(&output, 1000), "Tool result");
                output
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
