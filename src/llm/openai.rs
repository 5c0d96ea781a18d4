//! OpenAI-compatible HTTP client for chat completions with tool calling.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ChatMessage, ChatResponse, LlmClient, ToolCall, ToolDefinition};
use crate::config::GatewayConfig;
use crate::error::AgentError;

/// Client for any endpoint exposing `POST {base}/chat/completions`.
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::UpstreamUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            completions_url: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatResponse, AgentError> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let resp = self
            .http
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::UpstreamUnavailable(format!("LLM request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(AgentError::UpstreamUnavailable(format!(
                "LLM error ({}): {}",
                status, body_text
            )));
        }

        let parsed: CompletionResponse = resp.json().await.map_err(|e| {
            AgentError::UpstreamUnavailable(format!("Failed to parse LLM response: {}", e))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AgentError::UpstreamUnavailable("LLM returned no choices".to_string()))?;

        Ok(ChatResponse {
            content: message.content,
            tool_calls: message.tool_calls,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}
