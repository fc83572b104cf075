use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tracked post URL as stored in `url_notifications`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TrackedUrl {
    pub doc_id: String,
    pub url: String,
    pub last_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Per-URL result of one notification attempt. In-memory only; exists to
/// build the summary report and the run result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub url: String,
    pub status: OutcomeStatus,
    pub http_status: u16,
    pub message: String,
}

impl NotificationOutcome {
    pub fn success(url: impl Into<String>, http_status: u16) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Success,
            http_status,
            message: "OK".to_string(),
        }
    }

    pub fn failed(url: impl Into<String>, http_status: u16, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: OutcomeStatus::Failed,
            http_status,
            message: message.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// What a run hands back to its invoker: the itemized outcomes, or an error
/// descriptor when configuration failed before any side effect.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RunResult {
    Completed { results: Vec<NotificationOutcome> },
    ConfigError { error: String },
}

impl RunResult {
    pub fn completed(results: Vec<NotificationOutcome>) -> Self {
        RunResult::Completed { results }
    }

    pub fn config_error(error: impl Into<String>) -> Self {
        RunResult::ConfigError {
            error: error.into(),
        }
    }
}
