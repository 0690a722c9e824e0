//! Host executor
//!
//! - `HostExecutor` - drains the queue once per cooperative tick on the host thread
//! - `CommandHandler` - per-kind handler trait the executor dispatches to

pub mod host;
pub mod r#trait;

pub use host::{HostExecutor, TickReport};
pub use r#trait::CommandHandler;
