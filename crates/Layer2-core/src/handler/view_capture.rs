//! ViewCapture handler - render the active camera and return the image
//!
//! The camera check runs first so a scene without one never touches the
//! backend or the output file. Everything after that funnels into
//! [`CaptureError`] and comes back as an error result.

use crate::render::{RenderBackend, RenderError, RenderSettings};
use crate::scene::SharedScene;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hostbridge_foundation::RenderConfig;
use hostbridge_task::{CommandHandler, Task, TaskKind, TaskResult};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const NO_CAMERA_MESSAGE: &str =
    "no camera: add a camera and make it the active camera before capturing";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("render produced no output")]
    NoOutput,

    #[error("failed to remove stale capture {path}: {source}")]
    StaleFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read capture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Where and how captures are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub output_dir: PathBuf,
    pub file_stem: String,
    pub preferred_engine: String,
    pub fallback_engine: String,
    pub width: u32,
    pub height: u32,
}

impl CaptureConfig {
    /// Output path without extension
    pub fn target(&self) -> PathBuf {
        self.output_dir.join(&self.file_stem)
    }
}

impl From<&RenderConfig> for CaptureConfig {
    fn from(config: &RenderConfig) -> Self {
        Self {
            output_dir: config.output_dir(),
            file_stem: config.file_stem.clone(),
            preferred_engine: config.preferred_engine.clone(),
            fallback_engine: config.fallback_engine.clone(),
            width: config.width,
            height: config.height,
        }
    }
}

pub struct ViewCaptureHandler<R: RenderBackend> {
    scene: SharedScene,
    backend: R,
    config: CaptureConfig,
}

impl<R: RenderBackend> ViewCaptureHandler<R> {
    pub const NAME: &'static str = "view_capture";

    pub fn new(scene: SharedScene, backend: R, config: CaptureConfig) -> Self {
        Self {
            scene,
            backend,
            config,
        }
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    /// Preferred engine when the backend has it, the fallback otherwise
    fn select_engine(&self) -> String {
        if self.backend.supports_engine(&self.config.preferred_engine) {
            self.config.preferred_engine.clone()
        } else {
            debug!(
                preferred = %self.config.preferred_engine,
                fallback = %self.config.fallback_engine,
                "Preferred engine unavailable"
            );
            self.config.fallback_engine.clone()
        }
    }

    fn capture(&mut self) -> Result<String, CaptureError> {
        let settings = RenderSettings {
            engine: self.select_engine(),
            filepath: self.config.target(),
            width: self.config.width,
            height: self.config.height,
        };
        let path = settings.output_path();

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed stale capture"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CaptureError::StaleFile { path, source }),
        }

        {
            let scene = self.scene.borrow();
            self.backend.render_still(&scene, &settings)?;
        }

        if !path.exists() {
            return Err(CaptureError::NoOutput);
        }
        let bytes = std::fs::read(&path).map_err(|source| CaptureError::Read {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            engine = %settings.engine,
            bytes = bytes.len(),
            backend = self.backend.name(),
            "View captured"
        );
        Ok(STANDARD.encode(bytes))
    }
}

impl<R: RenderBackend> CommandHandler for ViewCaptureHandler<R> {
    fn kind(&self) -> TaskKind {
        TaskKind::ViewCapture
    }

    fn handle(&mut self, task: &Task) -> TaskResult {
        if self.scene.borrow().camera().is_none() {
            debug!(task = %task.id, "Capture refused, no active camera");
            return TaskResult::error(NO_CAMERA_MESSAGE);
        }

        match self.capture() {
            Ok(encoded) => TaskResult::image(encoded),
            Err(e) => {
                warn!(task = %task.id, error = %e, "View capture failed");
                TaskResult::error(e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
