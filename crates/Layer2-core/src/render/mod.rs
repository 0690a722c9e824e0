//! Render backend
//!
//! The host's render call is synchronous and pinned to the host thread, so it
//! sits behind this narrow trait. The capture handler only knows how to pick
//! an engine, ask for a still, and look for the file.

mod software;

pub use software::{HostVersion, SoftwareRenderer};

use crate::scene::Scene;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render engine '{0}' is not available")]
    UnsupportedEngine(String),

    #[error("scene has no active camera")]
    NoCamera,

    #[error("failed to write render output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode render output: {0}")]
    Encode(#[from] image::ImageError),
}

/// Settings for a single-frame still
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Engine identifier, e.g. `EEVEE_NEXT`
    pub engine: String,

    /// Output path without extension; the backend appends `.png`
    pub filepath: PathBuf,

    pub width: u32,
    pub height: u32,
}

impl RenderSettings {
    /// Where the backend writes the still
    pub fn output_path(&self) -> PathBuf {
        let mut path = self.filepath.clone().into_os_string();
        path.push(".png");
        PathBuf::from(path)
    }
}

/// Synchronous renderer running on the host thread
pub trait RenderBackend {
    /// Engine identifiers this host version supports
    fn engines(&self) -> Vec<String>;

    fn supports_engine(&self, engine: &str) -> bool {
        self.engines().iter().any(|e| e == engine)
    }

    /// Render one frame of the active camera to `settings.output_path()`.
    ///
    /// Blocks the calling (host) thread for the whole render.
    fn render_still(&mut self, scene: &Scene, settings: &RenderSettings) -> Result<(), RenderError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
