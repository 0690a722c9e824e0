//! Software renderer
//!
//! Orthographic top-down view centred on the active camera. The camera's
//! height sets the zoom. Meshes are painted lowest first; without any light
//! in the scene everything is drawn dim.

use super::{RenderBackend, RenderError, RenderSettings};
use crate::scene::{ObjectKind, Scene, SceneObject, Shape};
use image::{ImageFormat, Rgb, RgbImage};
use tracing::debug;

/// Version of the host, which decides the available engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
}

impl HostVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for HostVersion {
    fn default() -> Self {
        Self::new(4, 2)
    }
}

/// Engines were renamed in 4.2
const NEXT_ENGINE_SINCE: HostVersion = HostVersion::new(4, 2);

pub struct SoftwareRenderer {
    version: HostVersion,
    renders: u64,
    last_engine: Option<String>,
}

impl SoftwareRenderer {
    pub fn new(version: HostVersion) -> Self {
        Self {
            version,
            renders: 0,
            last_engine: None,
        }
    }

    /// Number of completed renders
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn last_engine(&self) -> Option<&str> {
        self.last_engine.as_deref()
    }
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self::new(HostVersion::default())
    }
}

impl RenderBackend for SoftwareRenderer {
    fn engines(&self) -> Vec<String> {
        let mut engines = vec!["WORKBENCH".to_string()];
        if self.version >= NEXT_ENGINE_SINCE {
            engines.push("EEVEE_NEXT".to_string());
        } else {
            engines.push("EEVEE".to_string());
        }
        engines
    }

    fn render_still(&mut self, scene: &Scene, settings: &RenderSettings) -> Result<(), RenderError> {
        if !self.supports_engine(&settings.engine) {
            return Err(RenderError::UnsupportedEngine(settings.engine.clone()));
        }
        let camera = scene.camera().ok_or(RenderError::NoCamera)?;

        let (width, height) = (settings.width, settings.height);
        let mut image = RgbImage::from_fn(width, height, |_, y| {
            let shade = 40 + (y * 40 / height.max(1)) as u8;
            Rgb([shade, shade, shade + 10])
        });

        let view = View::new(camera, width, height);
        let dim = !scene.has_lights();

        let mut drawables: Vec<&SceneObject> = scene
            .objects()
            .iter()
            .filter(|o| !o.is_camera())
            .collect();
        drawables.sort_by(|a, b| a.location[2].total_cmp(&b.location[2]));

        for object in drawables {
            view.paint(&mut image, object, dim);
        }

        let path = settings.output_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save_with_format(&path, ImageFormat::Png)?;

        self.renders += 1;
        self.last_engine = Some(settings.engine.clone());
        debug!(path = %path.display(), engine = %settings.engine, "Still rendered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "software"
    }
}

/// World-to-pixel mapping for one render
struct View {
    center: [f64; 2],
    scale: f64,
    width: u32,
    height: u32,
}

impl View {
    fn new(camera: &SceneObject, width: u32, height: u32) -> Self {
        // a camera at height h sees roughly 2h world units vertically
        let extent = camera.location[2].abs().max(1.0) * 2.0;
        Self {
            center: [camera.location[0], camera.location[1]],
            scale: f64::from(height) / extent,
            width,
            height,
        }
    }

    fn project(&self, location: [f64; 3]) -> (f64, f64) {
        let px = f64::from(self.width) / 2.0 + (location[0] - self.center[0]) * self.scale;
        let py = f64::from(self.height) / 2.0 - (location[1] - self.center[1]) * self.scale;
        (px, py)
    }

    fn paint(&self, image: &mut RgbImage, object: &SceneObject, dim: bool) {
        let (cx, cy) = self.project(object.location);
        let (radius, shape) = match object.kind {
            ObjectKind::Mesh(shape) => ((object.size / 2.0 * self.scale).max(1.0), shape),
            ObjectKind::Light => (3.0, Shape::Sphere),
            ObjectKind::Camera => return,
        };
        let color = if dim {
            object.color.map(|c| (u16::from(c) * 35 / 100) as u8)
        } else {
            object.color
        };

        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let inside = match shape {
                    Shape::Cube => true,
                    Shape::Sphere => {
                        let dx = f64::from(x) + 0.5 - cx;
                        let dy = f64::from(y) + 0.5 - cy;
                        dx * dx + dy * dy <= radius * radius
                    }
                };
                if inside {
                    image.put_pixel(x, y, Rgb(color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(dir: &std::path::Path, engine: &str) -> RenderSettings {
        RenderSettings {
            engine: engine.to_string(),
            filepath: dir.join("still"),
            width: 32,
            height: 24,
        }
    }

    fn scene_with_camera() -> Scene {
        let mut scene = Scene::new();
        scene.add(SceneObject::camera("Camera", [0.0, 0.0, 5.0])).unwrap();
        scene
            .add(SceneObject::mesh("Cube", Shape::Cube, [0.0, 0.0, 1.0], 2.0))
            .unwrap();
        scene.add(SceneObject::light("Sun", [2.0, 2.0, 4.0])).unwrap();
        scene
    }

    #[test]
    fn test_engine_list_depends_on_version() {
        let modern = SoftwareRenderer::new(HostVersion::new(4, 2));
        assert!(modern.supports_engine("EEVEE_NEXT"));
        assert!(!modern.supports_engine("EEVEE"));

        let legacy = SoftwareRenderer::new(HostVersion::new(3, 6));
        assert!(legacy.supports_engine("EEVEE"));
        assert!(!legacy.supports_engine("EEVEE_NEXT"));
    }

    #[test]
    fn test_render_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SoftwareRenderer::default();
        let settings = settings(dir.path(), "EEVEE_NEXT");

        renderer.render_still(&scene_with_camera(), &settings).unwrap();

        let bytes = std::fs::read(settings.output_path()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(renderer.renders(), 1);
        assert_eq!(renderer.last_engine(), Some("EEVEE_NEXT"));

        let decoded = image::open(settings.output_path()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_unsupported_engine_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SoftwareRenderer::new(HostVersion::new(3, 6));
        let err = renderer
            .render_still(&scene_with_camera(), &settings(dir.path(), "EEVEE_NEXT"))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedEngine(_)));
        assert_eq!(renderer.renders(), 0);
    }

    #[test]
    fn test_no_camera_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = SoftwareRenderer::default();
        let err = renderer
            .render_still(&Scene::new(), &settings(dir.path(), "WORKBENCH"))
            .unwrap_err();
        assert!(matches!(err, RenderError::NoCamera));
        assert!(!PathBuf::from(dir.path().join("still.png")).exists());
    }
}
