//! Executor integration tests - producers on a tokio runtime, ticks on this thread
//!
//! `cargo test -p hostbridge-task --test executor_test`

use hostbridge_task::{
    ChannelError, CommandHandler, HostExecutor, HostLoop, Scheduler, Task, TaskKind, TaskQueue,
    TaskResult,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Echoes the payload, sleeping first when it starts with `sleep`
struct EchoHandler {
    log: Rc<RefCell<Vec<String>>>,
}

impl CommandHandler for EchoHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::CodeExec
    }

    fn handle(&mut self, task: &Task) -> TaskResult {
        let source = task.source().to_string();
        if source.starts_with("sleep") {
            std::thread::sleep(Duration::from_millis(300));
        }
        if source == "panic" {
            panic!("handler exploded");
        }
        self.log.borrow_mut().push(source.clone());
        TaskResult::text(source)
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

fn executor(queue: &TaskQueue) -> (HostExecutor, Rc<RefCell<Vec<String>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let executor = HostExecutor::new(queue.clone()).with_handler(EchoHandler {
        log: Rc::clone(&log),
    });
    (executor, log)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn test_waiters_on_other_threads_receive_results() {
    let rt = runtime();
    let queue = TaskQueue::new();
    let (mut executor, _) = executor(&queue);

    let waiters: Vec<_> = (0..8)
        .map(|i| {
            let queue = queue.clone();
            rt.spawn(async move {
                let (task, rx) = Task::code_exec(format!("job-{i}"));
                queue.enqueue(task);
                rx.recv(Duration::from_secs(5)).await
            })
        })
        .collect();

    let host_loop = HostLoop::new();
    host_loop.register(
        "tick",
        Duration::ZERO,
        Box::new(move || {
            executor.tick();
            Some(Duration::from_millis(5))
        }),
    );
    host_loop.run_until(Duration::from_millis(5), || {
        waiters.iter().all(|w| w.is_finished())
    });

    for (i, waiter) in waiters.into_iter().enumerate() {
        let result = rt.block_on(waiter).unwrap().unwrap();
        assert_eq!(result, TaskResult::text(format!("job-{i}")));
    }
}

#[test]
fn test_single_producer_order_is_kept_across_ticks() {
    let queue = TaskQueue::new();
    let (mut executor, log) = executor(&queue);

    let (a, _rx_a) = Task::code_exec("A");
    queue.enqueue(a);
    executor.tick();
    let (b, _rx_b) = Task::code_exec("B");
    let (c, _rx_c) = Task::code_exec("C");
    queue.enqueue(b);
    queue.enqueue(c);
    executor.tick();

    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
}

#[test]
fn test_timed_out_caller_does_not_break_the_tick() {
    let rt = runtime();
    let queue = TaskQueue::new();
    let (mut executor, log) = executor(&queue);

    let (slow, slow_rx) = Task::code_exec("sleep then answer");
    let (fast, fast_rx) = Task::code_exec("after");
    queue.enqueue(slow);
    queue.enqueue(fast);

    let waiter = rt.spawn(async move { slow_rx.recv(Duration::from_millis(50)).await });
    // wait for the caller to give up before the host gets to it
    let timed_out = rt.block_on(waiter).unwrap();
    assert!(matches!(timed_out, Err(ChannelError::Timeout(_))));

    let report = executor.tick();
    assert_eq!(report.executed, 2);
    assert_eq!(report.abandoned, 1);
    assert_eq!(*log.borrow(), vec!["sleep then answer", "after"]);

    let result = rt.block_on(fast_rx.recv(Duration::from_secs(1))).unwrap();
    assert_eq!(result, TaskResult::text("after"));
}

#[test]
fn test_panicking_handler_yields_error_and_next_task_runs() {
    let rt = runtime();
    let queue = TaskQueue::new();
    let (mut executor, _) = executor(&queue);

    let (bad, bad_rx) = Task::code_exec("panic");
    let (good, good_rx) = Task::code_exec("fine");
    queue.enqueue(bad);
    queue.enqueue(good);

    let report = executor.tick();
    assert_eq!(report.failed, 1);

    let bad_result = rt.block_on(bad_rx.recv(Duration::from_secs(1))).unwrap();
    assert!(bad_result.message().unwrap().contains("handler exploded"));
    let good_result = rt.block_on(good_rx.recv(Duration::from_secs(1))).unwrap();
    assert_eq!(good_result, TaskResult::text("fine"));
}

#[test]
fn test_dropped_task_closes_the_channel() {
    let rt = runtime();
    let queue = TaskQueue::new();
    let (task, rx) = Task::view_capture();
    queue.enqueue(task);

    drop(queue.drain_all());
    let result = rt.block_on(rx.recv(Duration::from_secs(1)));
    assert!(matches!(result, Err(ChannelError::Closed)));
}
