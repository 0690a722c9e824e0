//! Command handlers
//!
//! One handler per [`TaskKind`](hostbridge_task::TaskKind), registered on the
//! [`HostExecutor`](hostbridge_task::HostExecutor):
//!
//! - `code_exec`: run caller source through a [`Sandbox`](crate::sandbox::Sandbox)
//! - `view_capture`: render the active camera through a
//!   [`RenderBackend`](crate::render::RenderBackend) and return the image

mod code_exec;
mod view_capture;

pub use code_exec::CodeExecHandler;
pub use view_capture::{CaptureConfig, CaptureError, ViewCaptureHandler, NO_CAMERA_MESSAGE};
