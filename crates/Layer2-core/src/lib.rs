//! hostbridge-core: command handlers and the bundled demo host
//!
//! Layer2 - what runs on the host thread
//!
//! # Modules
//!
//! - `handler`: `CodeExecHandler` and `ViewCaptureHandler`, the two commands
//!   the bridge serves
//! - `sandbox`: `Sandbox` capability and the embedded Lua implementation
//! - `render`: `RenderBackend` capability and the software renderer
//! - `scene`: the demo host's mutable state
//! - `host`: `DemoHost`, which wires all of the above into a `HostExecutor`
//!
//! # Example
//!
//! ```ignore
//! use hostbridge_core::DemoHost;
//! use hostbridge_foundation::RenderConfig;
//! use hostbridge_task::{HostLoop, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let host = DemoHost::new();
//! let mut executor = host.executor(queue.clone(), &RenderConfig::default())?;
//!
//! // on the host thread, periodically
//! executor.tick();
//! ```

pub mod handler;
pub mod host;
pub mod render;
pub mod sandbox;
pub mod scene;

pub use handler::{CaptureConfig, CaptureError, CodeExecHandler, ViewCaptureHandler, NO_CAMERA_MESSAGE};
pub use host::DemoHost;
pub use render::{HostVersion, RenderBackend, RenderError, RenderSettings, SoftwareRenderer};
pub use sandbox::{ExecutionFailure, LuaSandbox, Sandbox};
pub use scene::{ObjectKind, Scene, SceneError, SceneObject, Shape, SharedScene};
