//! Blocking client for a running bridge
//!
//! Never returns an error: transport and HTTP failures are folded into an
//! error [`ResponseBody`] so callers handle one shape.

use hostbridge_server::{ResponseBody, RunRequest, ViewRequest};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const CONNECTION_REFUSED: &str = "Connection refused. Is the host bridge running?";

pub struct BridgeClient {
    base_url: String,
    agent: ureq::Agent,
}

impl BridgeClient {
    #[cfg(test)]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    /// Client-side bound; keep it above the bridge's request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /run`
    pub fn execute(&self, code: &str) -> ResponseBody {
        self.post(
            "/run",
            RunRequest {
                code: code.to_string(),
            },
            "Timeout: the host took too long to execute.",
        )
    }

    /// `POST /view`
    pub fn capture(&self) -> ResponseBody {
        self.post("/view", ViewRequest::default(), "Timeout: rendering took too long.")
    }

    fn post(&self, path: &str, body: impl Serialize, timeout_message: &str) -> ResponseBody {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Sending request");

        match self.agent.post(&url).send_json(body) {
            Ok(response) => response
                .into_json::<ResponseBody>()
                .unwrap_or_else(|e| ResponseBody::error(format!("invalid response body: {e}"))),
            Err(ureq::Error::Status(504, _)) => ResponseBody::error(timeout_message),
            Err(ureq::Error::Status(code, response)) => {
                let text = response.into_string().unwrap_or_default();
                ResponseBody::error(format!("HTTP {code}: {text}"))
            }
            Err(ureq::Error::Transport(transport)) => {
                if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                    ResponseBody::error(CONNECTION_REFUSED)
                } else {
                    ResponseBody::error(format!("request failed: {transport}"))
                }
            }
        }
    }
}
