//! Response channel
//!
//! One-shot handoff of a single [`TaskResult`] from the host thread back to
//! the network task waiting for it. Both ends are consumed on use, so a
//! channel carries at most one value and is never reused.

use crate::task::TaskResult;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

/// Create a connected sender/receiver pair
pub fn response_channel() -> (ResponseSender, ResponseReceiver) {
    let (tx, rx) = oneshot::channel();
    (ResponseSender { tx }, ResponseReceiver { rx })
}

/// Outcome of writing a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The waiting caller received the result
    Delivered,

    /// Nobody was listening anymore; the result was discarded
    Abandoned,
}

/// Why a receiver got no result
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The wait bound elapsed. The task may still be running.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The sender was dropped without producing a result
    #[error("task dropped before producing a result")]
    Closed,
}

/// Write side, owned by the task
#[derive(Debug)]
pub struct ResponseSender {
    tx: oneshot::Sender<TaskResult>,
}

impl ResponseSender {
    /// Never blocks. Writing to a channel whose reader gave up is a no-op.
    pub fn send(self, result: TaskResult) -> Delivery {
        match self.tx.send(result) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Abandoned,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read side, owned by the caller
#[derive(Debug)]
pub struct ResponseReceiver {
    rx: oneshot::Receiver<TaskResult>,
}

impl ResponseReceiver {
    /// Wait up to `timeout` for the result.
    ///
    /// On timeout the receiver is dropped, which turns any later write into
    /// [`Delivery::Abandoned`].
    pub async fn recv(self, timeout: Duration) -> Result<TaskResult, ChannelError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(ChannelError::Closed),
            Err(_) => Err(ChannelError::Timeout(timeout)),
        }
    }

    /// Non-blocking check; `None` while the result is still pending.
    pub fn try_recv(&mut self) -> Option<Result<TaskResult, ChannelError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(Ok(result)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ChannelError::Closed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_then_recv() {
        let (tx, rx) = response_channel();
        assert_eq!(tx.send(TaskResult::text("2\n")), Delivery::Delivered);

        let result = rx.recv(Duration::from_secs(1)).await.unwrap();
        assert_eq!(result, TaskResult::text("2\n"));
    }

    #[tokio::test]
    async fn test_recv_times_out() {
        let (_tx, rx) = response_channel();
        let err = rx.recv(Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(err, ChannelError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_late_write_after_timeout_is_noop() {
        let (tx, rx) = response_channel();
        assert!(rx.recv(Duration::from_millis(10)).await.is_err());

        assert!(tx.is_abandoned());
        assert_eq!(tx.send(TaskResult::error("too late")), Delivery::Abandoned);
    }

    #[tokio::test]
    async fn test_dropped_sender_closes() {
        let (tx, rx) = response_channel();
        drop(tx);
        let err = rx.recv(Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err, ChannelError::Closed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_send_from_other_thread() {
        let (tx, rx) = response_channel();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send(TaskResult::image("iVBORw0KGgo="))
        });

        let result = rx.recv(Duration::from_secs(2)).await.unwrap();
        assert_eq!(result, TaskResult::image("iVBORw0KGgo="));
        assert_eq!(writer.join().unwrap(), Delivery::Delivered);
    }

    #[test]
    fn test_try_recv_pending_then_ready() {
        let (tx, mut rx) = response_channel();
        assert!(rx.try_recv().is_none());
        tx.send(TaskResult::text(""));
        assert_eq!(rx.try_recv(), Some(Ok(TaskResult::text(""))));
    }
}
