//! # hostbridge-task
//!
//! The bridge between network threads and a single-threaded host.
//!
//! ## Features
//!
//! - `ResponseChannel` - one-shot result handoff, safe to write after the
//!   reader gave up
//! - `TaskQueue` - thread-safe FIFO shared by all producers
//! - `HostExecutor` - cooperative tick that drains the queue on the host thread
//! - `Scheduler` - "call me periodically on your thread", with `HostLoop` as
//!   the bundled implementation

pub mod channel;
pub mod executor;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use channel::{response_channel, ChannelError, Delivery, ResponseReceiver, ResponseSender};
pub use executor::{CommandHandler, HostExecutor, TickReport};
pub use queue::TaskQueue;
pub use scheduler::{HostLoop, Scheduler, TickFn};
pub use task::{Task, TaskId, TaskKind, TaskOutput, TaskResult};
