//! Sandbox capability
//!
//! "Execute source text against the host's live state, capture standard
//! output, report success or a structured failure."
//!
//! Despite the name, implementations perform no isolation: submitted code has
//! the same reach into host state as the host itself. Hardening against
//! untrusted input would be a new implementation of this trait.

mod lua;

pub use lua::LuaSandbox;

use thiserror::Error;

/// Runs caller-supplied source on the host thread
pub trait Sandbox {
    /// Execute `source` to completion.
    ///
    /// Returns everything written to standard output, verbatim apart from
    /// invalid UTF-8, which is replaced with U+FFFD. On failure, side effects
    /// applied before the failing statement are kept.
    fn execute(&mut self, source: &str) -> Result<String, ExecutionFailure>;

    /// Sandbox name for logs
    fn name(&self) -> &'static str;
}

/// A failure raised by submitted code
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ExecutionFailure {
    /// Error type name, e.g. `RuntimeError`, `SyntaxError`
    pub kind: String,

    /// Error message
    pub message: String,

    /// Call sequence leading to the error, when the interpreter provides one
    pub traceback: Option<String>,
}

impl ExecutionFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// Full report for the remote caller: type, message, then traceback
    pub fn diagnostic(&self) -> String {
        match &self.traceback {
            Some(traceback) => format!("{}: {}\n{}", self.kind, self.message, traceback),
            None => format!("{}: {}", self.kind, self.message),
        }
    }
}
