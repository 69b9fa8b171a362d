use crate::{Camera, CameraConfig, ObjectId, PhysicsWorld, PixelBuffer, Renderer, Scene, Viewport};
use rapier3d::prelude::RigidBodyHandle;

/// Render surface, camera, lights and the list of bodies the frame loop syncs
pub struct World {
    pub scene: Scene,
    pub camera: Camera,
    pub renderer: Renderer,
    viewport: Viewport,
    dynamic: Vec<ObjectId>,
}

impl World {
    pub fn new(camera: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::new(camera, viewport.aspect()),
            renderer: Renderer::new(viewport),
            viewport,
            dynamic: Vec::new(),
        }
    }

    /// Mark an object as driven by a dynamic physics body
    pub fn register_dynamic(&mut self, id: ObjectId) {
        self.dynamic.push(id);
    }

    pub fn dynamic_objects(&self) -> &[ObjectId] {
        &self.dynamic
    }

    /// Physics handles of every dynamic object
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = RigidBodyHandle> + '_ {
        self.dynamic
            .iter()
            .filter_map(|&id| self.scene.get(id).and_then(|o| o.body))
    }

    /// Copy each dynamic body's pose onto its mesh.
    /// Physics is the source of truth; poses only flow physics -> render.
    pub fn sync_from(&mut self, physics: &PhysicsWorld) {
        for &id in &self.dynamic {
            let Some(object) = self.scene.get_mut(id) else {
                continue;
            };
            if let Some(pose) = object.body.and_then(|body| physics.pose(body)) {
                object.set_pose(&pose);
            }
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Match camera aspect and renderer size to a new surface size.
    /// Returns false (and changes nothing) for a degenerate size.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.viewport = Viewport { width, height };
        self.camera.set_aspect(self.viewport.aspect());
        self.renderer.set_size(width, height);
        true
    }

    pub fn render(&mut self) {
        self.renderer.render(&self.scene, &self.camera);
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.renderer.buffer
    }
}
