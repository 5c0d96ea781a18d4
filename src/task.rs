//! Input to one agent run.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Where the run gets its context from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSource {
    /// Scrape this page for the task description.
    Url(String),
    /// Use this text directly.
    Question(String),
}

/// Caller identity echoed into the submission payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// One unit of agent work. Never mutated once created.
#[derive(Debug, Clone)]
pub struct Task {
    id: Uuid,
    source: TaskSource,
    credentials: Option<Credentials>,
}

impl Task {
    /// A quiz page whose answer must be posted back with `credentials`.
    pub fn submission(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: TaskSource::Url(url.into()),
            credentials: Some(credentials),
        }
    }

    /// A question answered without any submission.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: TaskSource::Question(text.into()),
            credentials: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &TaskSource {
        &self.source
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Submission-flow tasks must end with a `submit_url`.
    pub fn requires_submission(&self) -> bool {
        self.credentials.is_some()
    }

    /// The page URL, for URL-driven tasks.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            TaskSource::Url(url) => Some(url),
            TaskSource::Question(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secret() {
        let task = Task::submission(
            "https://quiz.example.com/1",
            Credentials {
                email: "student@example.com".into(),
                secret: "hunter2".into(),
            },
        );
        let rendered = format!("{:?}", task);
        assert!(rendered.contains("student@example.com"));
        assert!(!rendered.contains("hunter2"));
        assert!(task.requires_submission());
        assert_eq!(task.url(), Some("https://quiz.example.com/1"));
    }

    #[test]
    fn question_tasks_do_not_submit() {
        let task = Task::question("What is 2 + 2?");
        assert!(!task.requires_submission());
        assert_eq!(task.url(), None);
        assert!(task.credentials().is_none());
    }
}
