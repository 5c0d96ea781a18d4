//! Router construction and shared handler state.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::qa::answer_question;
use super::solve::solve;
use super::types::HealthResponse;
use crate::agent::QuestionAnswerer;
use crate::worker::TaskQueue;

/// Uploads larger than this are rejected before reaching the handler.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// State behind `POST /solve`.
pub struct SolveState {
    pub shared_secret: String,
    pub queue: TaskQueue,
}

/// State behind `POST /api`.
pub struct QaState {
    pub answerer: Arc<QuestionAnswerer>,
    pub upload_dir: PathBuf,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub fn agent_router(state: Arc<SolveState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/solve", post(solve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn qa_router(state: Arc<QaState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api", post(answer_question))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::ToolConfig;
    use crate::error::AgentError;
    use crate::llm::{ChatMessage, ChatResponse, LlmClient, ToolDefinition};
    use crate::task::TaskSource;
    use crate::tools::{ToolContext, ToolRegistry};

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn solve_request(secret: &str) -> Request<Body> {
        let body = json!({
            "email": "student@example.com",
            "secret": secret,
            "url": "https://quiz.example.com/q1"
        });
        Request::post("/solve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn wrong_secret_is_forbidden_and_not_queued() {
        let (queue, mut rx) = TaskQueue::new();
        let app = agent_router(Arc::new(SolveState {
            shared_secret: "s3cret".into(),
            queue,
        }));

        let resp = app.oneshot(solve_request("guess")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await, json!({"detail": "Invalid Secret"}));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn matching_secret_queues_task() {
        let (queue, mut rx) = TaskQueue::new();
        let app = agent_router(Arc::new(SolveState {
            shared_secret: "s3cret".into(),
            queue,
        }));

        let resp = app.oneshot(solve_request("s3cret")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Agent started");
        assert_eq!(body["status"], "ok");

        let task = rx.try_recv().expect("queued task");
        assert_eq!(body["task_id"], task.id().to_string());
        assert_eq!(
            task.source(),
            &TaskSource::Url("https://quiz.example.com/q1".into())
        );
        assert_eq!(task.credentials().unwrap().email, "student@example.com");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (queue, _rx) = TaskQueue::new();
        let app = agent_router(Arc::new(SolveState {
            shared_secret: "s3cret".into(),
            queue,
        }));

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    /// Records the question it was asked and answers with plain text.
    struct EchoLlm {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn chat_completion(
            &self,
            messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ChatResponse, AgentError> {
            if self.fail {
                return Err(AgentError::UpstreamUnavailable("proxy down".into()));
            }
            let question = messages[0].content.clone().unwrap_or_default();
            self.seen.lock().unwrap().push(question);
            Ok(ChatResponse {
                content: Some("42".into()),
                tool_calls: None,
            })
        }
    }

    fn qa_app(llm: Arc<EchoLlm>, dir: &TempDir) -> Router {
        let tools = ToolRegistry::qa_tools(ToolContext::new(ToolConfig::new(dir.path().to_path_buf())));
        qa_router(Arc::new(QaState {
            answerer: Arc::new(QuestionAnswerer::new(llm, Arc::new(tools))),
            upload_dir: dir.path().join("uploads"),
        }))
    }

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::post("/api")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn question_without_file_is_answered() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(EchoLlm { seen: Mutex::new(Vec::new()), fail: false });

        let resp = qa_app(llm.clone(), &dir)
            .oneshot(multipart(&[("question", None, "What is 6 * 7?")]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"answer": "42"}));
        assert_eq!(*llm.seen.lock().unwrap(), vec!["What is 6 * 7?".to_string()]);
    }

    #[tokio::test]
    async fn uploaded_file_is_stored_and_mentioned() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(EchoLlm { seen: Mutex::new(Vec::new()), fail: false });

        let resp = qa_app(llm.clone(), &dir)
            .oneshot(multipart(&[
                ("question", None, "How many Wednesdays?"),
                ("file", Some("dates.txt"), "2024-01-03\n"),
            ]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let seen = llm.seen.lock().unwrap().clone();
        let prefix = "How many Wednesdays? (File saved to ";
        assert!(seen[0].starts_with(prefix), "{}", seen[0]);
        let saved = PathBuf::from(seen[0].trim_start_matches(prefix).trim_end_matches(')'));
        assert!(saved.starts_with(dir.path().join("uploads")));
        assert!(saved.file_name().unwrap().to_string_lossy().starts_with("dates_"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "2024-01-03\n");
    }

    #[tokio::test]
    async fn missing_question_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(EchoLlm { seen: Mutex::new(Vec::new()), fail: false });

        let resp = qa_app(llm, &dir)
            .oneshot(multipart(&[("file", Some("a.txt"), "x")]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn gateway_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(EchoLlm { seen: Mutex::new(Vec::new()), fail: true });

        let resp = qa_app(llm, &dir)
            .oneshot(multipart(&[("question", None, "Anything")]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(resp).await["detail"]
            .as_str()
            .unwrap()
            .contains("proxy down"));
    }
}
