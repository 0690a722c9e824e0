//! CodeExec handler - run submitted source against the live host state

use crate::sandbox::Sandbox;
use hostbridge_task::{CommandHandler, Task, TaskKind, TaskResult};
use tracing::{debug, info, warn};

pub struct CodeExecHandler<S: Sandbox> {
    sandbox: S,
}

impl<S: Sandbox> CodeExecHandler<S> {
    pub const NAME: &'static str = "code_exec";

    pub fn new(sandbox: S) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &S {
        &self.sandbox
    }
}

impl<S: Sandbox> CommandHandler for CodeExecHandler<S> {
    fn kind(&self) -> TaskKind {
        TaskKind::CodeExec
    }

    fn handle(&mut self, task: &Task) -> TaskResult {
        // a missing payload runs as empty source
        match self.sandbox.execute(task.source()) {
            Ok(output) => {
                info!(task = %task.id, sandbox = self.sandbox.name(), "Executed code successfully");
                debug!(task = %task.id, %output, "Captured output");
                TaskResult::text(output)
            }
            Err(failure) => {
                warn!(task = %task.id, error = %failure, "Code execution failed");
                TaskResult::error(failure.diagnostic())
            }
        }
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
