//! Task definition and types

use crate::channel::{response_channel, Delivery, ResponseReceiver, ResponseSender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// What a task asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Run caller-supplied source against host state
    CodeExec,

    /// Render the active camera and return the image
    ViewCapture,
}

impl TaskKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskKind::CodeExec => "code_exec",
            TaskKind::ViewCapture => "view_capture",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A unit of submitted work paired with the channel its result goes back on.
///
/// Not `Clone`: the responder is single-use, so a task can only be enqueued
/// and answered once.
#[derive(Debug)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Command kind
    pub kind: TaskKind,

    /// Source text for `CodeExec`; unused by `ViewCapture`
    pub payload: Option<String>,

    /// When the listener created the task
    pub created_at: DateTime<Utc>,

    responder: ResponseSender,
}

impl Task {
    /// Create a task and the receiver its caller waits on
    pub fn new(kind: TaskKind, payload: Option<String>) -> (Self, ResponseReceiver) {
        let (responder, receiver) = response_channel();
        let task = Self {
            id: TaskId::new(),
            kind,
            payload,
            created_at: Utc::now(),
            responder,
        };
        (task, receiver)
    }

    pub fn code_exec(source: impl Into<String>) -> (Self, ResponseReceiver) {
        Self::new(TaskKind::CodeExec, Some(source.into()))
    }

    pub fn view_capture() -> (Self, ResponseReceiver) {
        Self::new(TaskKind::ViewCapture, None)
    }

    /// Payload as text, empty when absent
    pub fn source(&self) -> &str {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Whether the caller has already stopped waiting
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_abandoned()
    }

    /// Time since the task was created
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }

    /// Deliver the result, consuming the task
    pub fn respond(self, result: TaskResult) -> Delivery {
        self.responder.send(result)
    }
}

/// Successful task payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    /// Captured standard output of a code execution
    Text(String),

    /// Base64-encoded image of a view capture
    Image(String),
}

/// Result of a task, produced exactly once per task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Success(TaskOutput),
    Error { message: String },
}

impl TaskResult {
    pub fn text(output: impl Into<String>) -> Self {
        TaskResult::Success(TaskOutput::Text(output.into()))
    }

    pub fn image(encoded: impl Into<String>) -> Self {
        TaskResult::Success(TaskOutput::Image(encoded.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        TaskResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    /// Error message, if this is an error
    pub fn message(&self) -> Option<&str> {
        match self {
            TaskResult::Error { message } => Some(message),
            TaskResult::Success(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display_is_short() {
        let id = TaskId::new();
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_code_exec_payload() {
        let (task, _rx) = Task::code_exec("print(1)");
        assert_eq!(task.kind, TaskKind::CodeExec);
        assert_eq!(task.source(), "print(1)");
    }

    #[test]
    fn test_view_capture_has_no_payload() {
        let (task, _rx) = Task::view_capture();
        assert_eq!(task.kind, TaskKind::ViewCapture);
        assert!(task.payload.is_none());
        assert_eq!(task.source(), "");
    }

    #[test]
    fn test_abandoned_after_receiver_dropped() {
        let (task, rx) = Task::view_capture();
        assert!(!task.is_abandoned());
        drop(rx);
        assert!(task.is_abandoned());
        assert_eq!(task.respond(TaskResult::image("AAAA")), Delivery::Abandoned);
    }

    #[test]
    fn test_result_helpers() {
        assert!(TaskResult::text("2\n").is_success());
        let err = TaskResult::error("no camera");
        assert!(!err.is_success());
        assert_eq!(err.message(), Some("no camera"));
        assert_eq!(TaskKind::ViewCapture.to_string(), "view_capture");
    }
}
