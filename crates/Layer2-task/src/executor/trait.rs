//! Command handler trait

use crate::task::{Task, TaskKind, TaskResult};

/// Handler for one task kind - implement to teach the executor a new command.
///
/// Handlers run only on the host thread, one at a time, so they may hold
/// `!Send` host state and mutate it without locking.
pub trait CommandHandler {
    /// Kind of task this handler serves
    fn kind(&self) -> TaskKind;

    /// Execute the task to completion and produce its result.
    ///
    /// Failures belong in the returned [`TaskResult`]; a panic is caught by
    /// the executor but should not be relied on.
    fn handle(&mut self, task: &Task) -> TaskResult;

    /// Handler name for logs
    fn name(&self) -> &'static str;
}
