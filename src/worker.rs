//! Background execution of accepted tasks.
//!
//! HTTP handlers only [`TaskQueue::enqueue`] and return. The [`Worker`] owns
//! every task from then on: it runs the agent, submits the answer, and logs
//! the disposition. Nothing is reported back to the HTTP caller.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::{Agent, FinalAnswer};
use crate::error::AgentError;
use crate::submit::{SubmissionPayload, Submitter};
use crate::task::Task;

#[derive(Debug, Error)]
#[error("task queue is closed")]
pub struct QueueClosed;

/// Sending half handed to the HTTP layer.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    /// Create a queue and the receiver a [`Worker`] consumes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, task: Task) -> Result<Uuid, QueueClosed> {
        let id = task.id();
        self.tx.send(task).map_err(|_| QueueClosed)?;
        tracing::info!(task_id = %id, "Task queued");
        Ok(id)
    }
}

/// How a task ended.
#[derive(Debug)]
pub enum Disposition {
    Submitted { target: String, response: String },
    Answered(FinalAnswer),
    SubmissionFailed { target: String, error: AgentError },
    AgentFailed(AgentError),
}

pub struct Worker {
    agent: Arc<Agent>,
    submitter: Arc<Submitter>,
}

impl Worker {
    pub fn new(agent: Arc<Agent>, submitter: Arc<Submitter>) -> Self {
        Self { agent, submitter }
    }

    /// Consume tasks until every [`TaskQueue`] handle is dropped.
    ///
    /// Each task gets its own tokio task, so separate tasks run concurrently
    /// while each one stays strictly sequential inside.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Task>) {
        while let Some(task) = rx.recv().await {
            let agent = Arc::clone(&self.agent);
            let submitter = Arc::clone(&self.submitter);
            tokio::spawn(async move {
                process_task(&agent, &submitter, &task).await;
            });
        }
        tracing::info!("Task queue closed; worker exiting");
    }
}

/// Run one task end to end and log its disposition.
pub async fn process_task(agent: &Agent, submitter: &Submitter, task: &Task) -> Disposition {
    let task_id = task.id();
    tracing::info!(%task_id, source = ?task.source(), "Starting task");

    let disposition = match agent.run(task).await {
        Err(e) => Disposition::AgentFailed(e),
        Ok(answer) => match (task.credentials(), task.url(), answer.submit_url.clone()) {
            (Some(credentials), Some(url), Some(target)) => {
                let payload = SubmissionPayload::new(credentials, url, answer.answer);
                match submitter.submit(&target, &payload).await {
                    Ok(response) => Disposition::Submitted { target, response },
                    Err(error) => Disposition::SubmissionFailed { target, error },
                }
            }
            _ => Disposition::Answered(answer),
        },
    };

    match &disposition {
        Disposition::Submitted { target, .. } => {
            tracing::info!(%task_id, target = %target, "Task submitted")
        }
        Disposition::Answered(answer) => {
            tracing::info!(%task_id, answer = %answer.answer, "Task answered without submission")
        }
        Disposition::SubmissionFailed { target, error } => {
            tracing::error!(%task_id, target = %target, error = %error, "Submission failed")
        }
        Disposition::AgentFailed(error) => {
            tracing::error!(%task_id, error = %error, "Agent failed")
        }
    }
    disposition
}
