//! Demo host
//!
//! Bundles a scene, a Lua sandbox over it and a software renderer, and wires
//! both handlers into a [`HostExecutor`]. Everything here is `!Send` and
//! stays on the thread that created it.

use crate::handler::{CaptureConfig, CodeExecHandler, ViewCaptureHandler};
use crate::render::{HostVersion, SoftwareRenderer};
use crate::sandbox::LuaSandbox;
use crate::scene::{Scene, SharedScene};
use hostbridge_foundation::{RenderConfig, Result};
use hostbridge_task::{HostExecutor, TaskQueue};
use std::rc::Rc;
use tracing::info;

pub struct DemoHost {
    scene: SharedScene,
    version: HostVersion,
}

impl DemoHost {
    pub fn new() -> Self {
        Self::with_scene(Scene::new())
    }

    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene: scene.shared(),
            version: HostVersion::default(),
        }
    }

    /// Host version the renderer advertises engines for
    pub fn version(mut self, version: HostVersion) -> Self {
        self.version = version;
        self
    }

    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    /// Build an executor with the code and capture handlers registered
    pub fn executor(&self, queue: TaskQueue, render: &RenderConfig) -> Result<HostExecutor> {
        let sandbox = LuaSandbox::new(Rc::clone(&self.scene))?;
        let renderer = SoftwareRenderer::new(self.version);
        let capture = CaptureConfig::from(render);

        info!(
            version = %format!("{}.{}", self.version.major, self.version.minor),
            output_dir = %capture.output_dir.display(),
            "Demo host ready"
        );

        Ok(HostExecutor::new(queue)
            .with_handler(CodeExecHandler::new(sandbox))
            .with_handler(ViewCaptureHandler::new(
                Rc::clone(&self.scene),
                renderer,
                capture,
            )))
    }
}

impl Default for DemoHost {
    fn default() -> Self {
        Self::new()
    }
}
