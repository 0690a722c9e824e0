//! # hostbridge-server
//!
//! Layer3 - the network side of the bridge.
//!
//! - `listener`: axum routes on a dedicated `bridge-listener` thread; each
//!   request becomes a task on the shared queue and waits for its result
//! - `service`: `BridgeService`, the start/stop lifecycle tying the listener
//!   to the host's scheduler and executor
//! - `protocol`: request and response bodies
//!
//! ```ignore
//! let queue = TaskQueue::new();
//! let executor = DemoHost::new().executor(queue, &config.render)?;
//! let host_loop = HostLoop::new();
//! let mut service = BridgeService::new(config, host_loop.clone(), executor);
//! service.start()?;
//! host_loop.run_until(Duration::from_millis(50), || stopped());
//! service.stop();
//! ```

pub mod listener;
pub mod protocol;
pub mod service;

pub use listener::{build_router, spawn_listener, ListenerHandle};
pub use protocol::{ResponseBody, RunRequest, Status, ViewRequest};
pub use service::{BridgeService, TICK_TIMER};
