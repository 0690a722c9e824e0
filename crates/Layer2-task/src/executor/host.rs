//! Host Executor
//!
//! Cooperative consumer of the [`TaskQueue`]. The host's scheduler calls
//! [`HostExecutor::tick`] periodically on the host's designated thread; each
//! tick drains the queue and runs every task to completion, in order.
//!
//! ## Guarantees
//!
//! - Exactly one result is sent per drained task, whatever the handler does
//!   (errors, missing handler, panic).
//! - Tasks never run concurrently: the executor is `!Send` once handlers
//!   holding host state are registered, and `tick` takes `&mut self`.
//! - A result for a caller that already timed out is dropped silently.

use super::r#trait::CommandHandler;
use crate::channel::Delivery;
use crate::queue::TaskQueue;
use crate::task::{Task, TaskKind, TaskResult};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks drained and executed
    pub executed: usize,

    /// Tasks whose result was an error
    pub failed: usize,

    /// Results discarded because the caller stopped waiting
    pub abandoned: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.executed == 0
    }
}

/// Drains the queue on the host thread and dispatches to handlers
pub struct HostExecutor {
    queue: TaskQueue,
    handlers: HashMap<TaskKind, Box<dyn CommandHandler>>,
    total_executed: u64,
}

impl HostExecutor {
    pub fn new(queue: TaskQueue) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            total_executed: 0,
        }
    }

    /// Register a handler, replacing any previous one for the same kind
    pub fn with_handler(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.register(Box::new(handler));
        self
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        let kind = handler.kind();
        if let Some(previous) = self.handlers.insert(kind, handler) {
            warn!(%kind, replaced = previous.name(), "Handler replaced");
        }
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn total_executed(&self) -> u64 {
        self.total_executed
    }

    /// Run every task queued before this call, in FIFO order.
    ///
    /// Never calls `enqueue` and never blocks except inside a handler.
    pub fn tick(&mut self) -> TickReport {
        let tasks = self.queue.drain_all();
        let mut report = TickReport::default();

        for task in tasks {
            let started = Instant::now();
            let id = task.id;
            let kind = task.kind;

            let result = self.dispatch(&task);
            report.executed += 1;
            self.total_executed += 1;
            if !result.is_success() {
                report.failed += 1;
            }

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match task.respond(result) {
                Delivery::Delivered => {
                    debug!(task = %id, %kind, elapsed_ms, "Result delivered");
                }
                Delivery::Abandoned => {
                    report.abandoned += 1;
                    debug!(task = %id, %kind, elapsed_ms, "Caller stopped waiting, result discarded");
                }
            }
        }

        if !report.is_idle() {
            info!(
                executed = report.executed,
                failed = report.failed,
                abandoned = report.abandoned,
                "Tick processed tasks"
            );
        }
        report
    }

    fn dispatch(&mut self, task: &Task) -> TaskResult {
        let Some(handler) = self.handlers.get_mut(&task.kind) else {
            warn!(task = %task.id, kind = %task.kind, "No handler registered");
            return TaskResult::error(format!("no handler registered for {}", task.kind));
        };

        debug!(task = %task.id, handler = handler.name(), "Dispatching task");
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(task))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(task = %task.id, handler = handler.name(), %message, "Handler panicked");
                TaskResult::error(format!("handler panicked: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Appends each source to a shared log, fails on "fail", panics on "panic"
    struct RecordingHandler {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl CommandHandler for RecordingHandler {
        fn kind(&self) -> TaskKind {
            TaskKind::CodeExec
        }

        fn handle(&mut self, task: &Task) -> TaskResult {
            let source = task.source().to_string();
            self.log.borrow_mut().push(source.clone());
            match source.as_str() {
                "fail" => TaskResult::error("RuntimeError: fail"),
                "panic" => panic!("handler exploded"),
                _ => TaskResult::text(format!("{source}\n")),
            }
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn executor() -> (HostExecutor, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let executor = HostExecutor::new(TaskQueue::new())
            .with_handler(RecordingHandler { log: log.clone() });
        (executor, log)
    }

    #[tokio::test]
    async fn test_tick_runs_in_order_and_responds() {
        let (mut executor, log) = executor();
        let (a, rx_a) = Task::code_exec("A");
        let (b, rx_b) = Task::code_exec("B");
        executor.queue().enqueue(a);
        executor.queue().enqueue(b);

        let report = executor.tick();
        assert_eq!(report.executed, 2);
        assert_eq!(*log.borrow(), vec!["A", "B"]);

        let timeout = Duration::from_secs(1);
        assert_eq!(rx_a.recv(timeout).await.unwrap(), TaskResult::text("A\n"));
        assert_eq!(rx_b.recv(timeout).await.unwrap(), TaskResult::text("B\n"));
        assert!(executor.queue().is_empty());
    }

    #[tokio::test]
    async fn test_error_result_is_delivered() {
        let (mut executor, _log) = executor();
        let (task, rx) = Task::code_exec("fail");
        executor.queue().enqueue(task);

        let report = executor.tick();
        assert_eq!(report.failed, 1);
        let result = rx.recv(Duration::from_secs(1)).await.unwrap();
        assert!(result.message().unwrap().contains("RuntimeError"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error_and_next_task_still_runs() {
        let (mut executor, log) = executor();
        let (bad, rx_bad) = Task::code_exec("panic");
        let (good, rx_good) = Task::code_exec("after");
        executor.queue().enqueue(bad);
        executor.queue().enqueue(good);

        let report = executor.tick();
        assert_eq!(report.executed, 2);
        assert_eq!(*log.borrow(), vec!["panic", "after"]);

        let timeout = Duration::from_secs(1);
        let bad = rx_bad.recv(timeout).await.unwrap();
        assert!(bad.message().unwrap().contains("handler exploded"));
        assert!(rx_good.recv(timeout).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_missing_handler_reports_error() {
        let (mut executor, _log) = executor();
        let (task, rx) = Task::view_capture();
        executor.queue().enqueue(task);
        executor.tick();

        let result = rx.recv(Duration::from_secs(1)).await.unwrap();
        assert!(result.message().unwrap().contains("view_capture"));
    }

    #[tokio::test]
    async fn test_abandoned_result_is_swallowed() {
        let (mut executor, log) = executor();
        let (task, rx) = Task::code_exec("slow");
        executor.queue().enqueue(task);

        // caller gives up before the host gets to the task
        assert_eq!(
            rx.recv(Duration::from_millis(10)).await.unwrap_err(),
            ChannelError::Timeout(Duration::from_millis(10))
        );

        let report = executor.tick();
        assert_eq!(report.executed, 1);
        assert_eq!(report.abandoned, 1);
        // the task still ran to completion
        assert_eq!(*log.borrow(), vec!["slow"]);
    }

    #[test]
    fn test_idle_tick() {
        let (mut executor, _log) = executor();
        assert!(executor.tick().is_idle());
        assert_eq!(executor.total_executed(), 0);
    }
}
