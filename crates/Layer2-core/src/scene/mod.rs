//! Scene - the demo host's live, mutable state
//!
//! Shared between the sandbox (which mutates it) and the capture handler
//! (which reads it) on the host thread only, hence `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Host-thread handle to the scene
pub type SharedScene = Rc<RefCell<Scene>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("an object named '{0}' already exists")]
    DuplicateName(String),

    #[error("no object named '{0}'")]
    NoSuchObject(String),

    #[error("'{0}' is not a camera")]
    NotACamera(String),
}

impl SceneError {
    /// Type name reported in execution diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            SceneError::DuplicateName(_) => "DuplicateNameError",
            SceneError::NoSuchObject(_) => "KeyError",
            SceneError::NotACamera(_) => "TypeError",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Cube,
    Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh(Shape),
    Camera,
    Light,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub location: [f64; 3],
    /// Edge length of a cube, diameter of a sphere
    pub size: f64,
    pub color: [u8; 3],
}

impl SceneObject {
    pub fn mesh(name: impl Into<String>, shape: Shape, location: [f64; 3], size: f64) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh(shape),
            location,
            size,
            color: [200, 200, 200],
        }
    }

    pub fn camera(name: impl Into<String>, location: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Camera,
            location,
            size: 0.0,
            color: [0, 0, 0],
        }
    }

    pub fn light(name: impl Into<String>, location: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Light,
            location,
            size: 0.0,
            color: [255, 230, 120],
        }
    }

    pub fn is_camera(&self) -> bool {
        self.kind == ObjectKind::Camera
    }
}

/// Ordered collection of named objects with an optional active camera
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    camera: Option<String>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedScene {
        Rc::new(RefCell::new(self))
    }

    /// Add an object. The first camera added becomes the active camera.
    pub fn add(&mut self, object: SceneObject) -> Result<(), SceneError> {
        if self.get(&object.name).is_some() {
            return Err(SceneError::DuplicateName(object.name));
        }
        if object.is_camera() && self.camera.is_none() {
            self.camera = Some(object.name.clone());
        }
        self.objects.push(object);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| SceneError::NoSuchObject(name.to_string()))
    }

    /// Remove an object; removing the active camera leaves the scene without one
    pub fn remove(&mut self, name: &str) -> Result<SceneObject, SceneError> {
        let pos = self
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| SceneError::NoSuchObject(name.to_string()))?;
        if self.camera.as_deref() == Some(name) {
            self.camera = None;
        }
        Ok(self.objects.remove(pos))
    }

    pub fn set_camera(&mut self, name: &str) -> Result<(), SceneError> {
        let object = self
            .get(name)
            .ok_or_else(|| SceneError::NoSuchObject(name.to_string()))?;
        if !object.is_camera() {
            return Err(SceneError::NotACamera(name.to_string()));
        }
        self.camera = Some(name.to_string());
        Ok(())
    }

    /// Active camera, if any
    pub fn camera(&self) -> Option<&SceneObject> {
        self.camera.as_deref().and_then(|name| self.get(name))
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name.clone()).collect()
    }

    pub fn has_lights(&self) -> bool {
        self.objects.iter().any(|o| o.kind == ObjectKind::Light)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.camera = None;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_camera_becomes_active() {
        let mut scene = Scene::new();
        assert!(scene.camera().is_none());

        scene.add(SceneObject::camera("Camera", [0.0, 0.0, 10.0])).unwrap();
        scene.add(SceneObject::camera("Side", [5.0, 0.0, 1.0])).unwrap();
        assert_eq!(scene.camera().unwrap().name, "Camera");

        scene.set_camera("Side").unwrap();
        assert_eq!(scene.camera().unwrap().name, "Side");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut scene = Scene::new();
        scene
            .add(SceneObject::mesh("Cube", Shape::Cube, [0.0; 3], 2.0))
            .unwrap();
        let err = scene
            .add(SceneObject::mesh("Cube", Shape::Sphere, [1.0; 3], 1.0))
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateName("Cube".into()));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_set_camera_on_mesh_fails() {
        let mut scene = Scene::new();
        scene
            .add(SceneObject::mesh("Cube", Shape::Cube, [0.0; 3], 2.0))
            .unwrap();
        assert_eq!(
            scene.set_camera("Cube"),
            Err(SceneError::NotACamera("Cube".into()))
        );
        assert_eq!(
            scene.set_camera("Nope"),
            Err(SceneError::NoSuchObject("Nope".into()))
        );
    }

    #[test]
    fn test_removing_active_camera_clears_it() {
        let mut scene = Scene::new();
        scene.add(SceneObject::camera("Camera", [0.0; 3])).unwrap();
        scene.remove("Camera").unwrap();
        assert!(scene.camera().is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_names_keep_insertion_order() {
        let mut scene = Scene::new();
        scene.add(SceneObject::light("Sun", [0.0; 3])).unwrap();
        scene
            .add(SceneObject::mesh("Ball", Shape::Sphere, [0.0; 3], 1.0))
            .unwrap();
        assert_eq!(scene.names(), vec!["Sun", "Ball"]);
        assert!(scene.has_lights());
    }
}
