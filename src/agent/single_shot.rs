//! Single-shot tool selection for the synchronous Q&A endpoint.
//!
//! One model request, at most one tool execution, one answer. No loop.

use std::sync::Arc;

use crate::error::{AgentError, ToolError};
use crate::llm::{ChatMessage, LlmClient};
use crate::tools::ToolRegistry;

const NO_ANSWER: &str = "I could not determine the task.";

pub struct QuestionAnswerer {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl QuestionAnswerer {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { llm, tools }
    }

    /// Ask the model to pick a tool for `question` and return the result.
    ///
    /// Without a tool call the model's text is returned verbatim. With several
    /// tool calls only the first one runs. Tool failures become the answer text;
    /// only gateway failures are errors.
    pub async fn answer(&self, question: &str) -> Result<String, AgentError> {
        let schemas = self.tools.schemas();
        let response = self
            .llm
            .chat_completion(&[ChatMessage::user(question)], Some(&schemas))
            .await?;

        let Some(tool_call) = response.requested_tools().and_then(|calls| calls.first()) else {
            return Ok(response
                .content
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| NO_ANSWER.to_string()));
        };

        let name = &tool_call.function.name;
        tracing::info!(tool = %name, args = %tool_call.function.arguments, "Q&A selected tool");

        let result = match tool_call.parsed_arguments() {
            Ok(args) => self.tools.dispatch(name, args).await,
            Err(e) => Err(ToolError::argument(name, format!("arguments are not valid JSON: {}", e))),
        };

        Ok(result.unwrap_or_else(|e| format!("Error: {}", e)))
    }
}
