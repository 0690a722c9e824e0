//! Wire types
//!
//! Every response body has a `status` of `success` or `error`, plus exactly
//! one of `output`, `image` or `message`.

use hostbridge_task::{TaskOutput, TaskResult};
use serde::{Deserialize, Serialize};

/// Body of `POST /run`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRequest {
    /// Source to execute; missing means empty
    #[serde(default)]
    pub code: String,
}

/// Body the client sends to `POST /view`; the listener accepts any JSON value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewRequest {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseBody {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Base64 PNG; older hosts send it as `image_base64`
    #[serde(default, alias = "image_base64", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseBody {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            output: Some(output.into()),
            image: None,
            message: None,
        }
    }

    pub fn image(encoded: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            output: None,
            image: Some(encoded.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            output: None,
            image: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl From<&TaskResult> for ResponseBody {
    fn from(result: &TaskResult) -> Self {
        match result {
            TaskResult::Success(TaskOutput::Text(output)) => Self::output(output.as_str()),
            TaskResult::Success(TaskOutput::Image(encoded)) => Self::image(encoded.as_str()),
            TaskResult::Error { message } => Self::error(message.as_str()),
        }
    }
}
