//! Task queue
//!
//! FIFO shared between the network threads (producers) and the host
//! executor (sole consumer). The lock is held only for a push or a swap, so
//! `enqueue` never waits on task execution.

use crate::task::Task;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Thread-safe FIFO of pending tasks. Cloning shares the same queue.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    inner: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. Callable from any thread; never blocks on execution.
    pub fn enqueue(&self, task: Task) {
        let mut queue = self.inner.lock();
        trace!(task = %task.id, kind = %task.kind, depth = queue.len() + 1, "Task enqueued");
        queue.push_back(task);
    }

    /// Take every queued task in FIFO order, leaving the queue empty.
    ///
    /// Tasks enqueued after the swap stay for the next call.
    pub fn drain_all(&self) -> Vec<Task> {
        let drained = std::mem::take(&mut *self.inner.lock());
        Vec::from(drained)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_drain_preserves_fifo() {
        let queue = TaskQueue::new();
        let mut receivers = Vec::new();
        for i in 0..3 {
            let (task, rx) = Task::code_exec(format!("print({i})"));
            receivers.push(rx);
            queue.enqueue(task);
        }
        assert_eq!(queue.len(), 3);

        let sources: Vec<String> = queue
            .drain_all()
            .into_iter()
            .map(|t| t.source().to_string())
            .collect();
        assert_eq!(sources, vec!["print(0)", "print(1)", "print(2)"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty() {
        let queue = TaskQueue::new();
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = TaskQueue::new();
        let producers: Vec<_> = (0..8)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let (task, rx) = Task::code_exec(format!("{p}:{i}"));
                        // receiver is irrelevant here
                        drop(rx);
                        queue.enqueue(task);
                    }
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut done = false;
        while !done {
            done = producers.iter().all(|h| h.is_finished());
            for task in queue.drain_all() {
                assert!(seen.insert(task.id), "task drained twice");
            }
        }
        for handle in producers {
            handle.join().unwrap();
        }
        for task in queue.drain_all() {
            assert!(seen.insert(task.id), "task drained twice");
        }
        assert_eq!(seen.len(), 400);
    }

    #[test]
    fn test_single_producer_order_under_concurrency() {
        let queue = TaskQueue::new();
        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let (task, _rx) = Task::code_exec(i.to_string());
                    queue.enqueue(task);
                }
            })
        };
        producer.join().unwrap();

        let order: Vec<usize> = queue
            .drain_all()
            .iter()
            .map(|t| t.source().parse().unwrap())
            .collect();
        assert_eq!(order, (0..100).collect::<Vec<_>>());
    }
}
