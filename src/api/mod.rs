//! HTTP API for both entry points.
//!
//! ## Agent server (`quiz-agent`)
//!
//! - `POST /solve` - Validate the secret and queue a quiz URL
//! - `GET /health` - Health check
//!
//! ## Q&A server (`qa-server`)
//!
//! - `POST /api` - Answer a multipart question, optionally with a file
//! - `GET /health` - Health check

mod error;
mod qa;
mod routes;
mod solve;
pub mod types;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::ApiError;
pub use qa::{persist_upload, question_with_attachment};
pub use routes::{agent_router, qa_router, QaState, SolveState};

use crate::agent::{Agent, AgentLimits, QuestionAnswerer};
use crate::config::{AgentConfig, QaConfig};
use crate::fetcher::HttpPageFetcher;
use crate::llm::OpenAiCompatClient;
use crate::submit::Submitter;
use crate::tools::{ToolContext, ToolRegistry};
use crate::worker::{TaskQueue, Worker};

/// Run the agent server: wire the agent and worker, then serve `/solve`.
pub async fn serve_agent(config: AgentConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.tools.scratch_dir).await?;

    let llm = Arc::new(OpenAiCompatClient::new(&config.gateway)?);
    let tools = Arc::new(ToolRegistry::agent_tools(ToolContext::new(config.tools.clone())));
    let fetcher = Arc::new(HttpPageFetcher::new(config.fetch_timeout)?);
    let limits = AgentLimits {
        max_iterations: config.max_iterations,
        correction_retries: config.correction_retries,
    };
    let agent = Arc::new(Agent::new(llm, tools, fetcher, limits));
    let submitter = Arc::new(Submitter::new(config.submit_timeout)?);

    let (queue, rx) = TaskQueue::new();
    tokio::spawn(Worker::new(agent, submitter).run(rx));

    let app = agent_router(Arc::new(SolveState {
        shared_secret: config.shared_secret.clone(),
        queue,
    }));

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, model = %config.gateway.model, "Agent server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the Q&A server.
pub async fn serve_qa(config: QaConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let llm = Arc::new(OpenAiCompatClient::new(&config.gateway)?);
    let tools = Arc::new(ToolRegistry::qa_tools(ToolContext::new(config.tools.clone())));
    let answerer = Arc::new(QuestionAnswerer::new(llm, tools));

    let app = qa_router(Arc::new(QaState {
        answerer,
        upload_dir: config.upload_dir.clone(),
    }));

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, model = %config.gateway.model, "Q&A server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
