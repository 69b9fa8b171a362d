use crate::MaterialConfig;
use crate::physics::Pose;
use rapier3d::na::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::RigidBodyHandle;

/// Index of a render object inside its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [u8; 4],
    pub grid_repeat: Option<u32>,
}

impl From<&MaterialConfig> for Material {
    fn from(config: &MaterialConfig) -> Self {
        Self {
            color: rgba(config.color),
            grid_repeat: config.grid_repeat,
        }
    }
}

/// Expand 0xRRGGBB into opaque RGBA
pub fn rgba(hex: u32) -> [u8; 4] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255]
}

/// A box mesh placed in the scene
#[derive(Debug, Clone)]
pub struct RenderObject {
    pub name: String,
    pub size: Vector3<f32>,
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// Physics body whose pose drives this mesh
    pub body: Option<RigidBodyHandle>,
}

impl RenderObject {
    pub fn set_pose(&mut self, pose: &Pose) {
        self.position = Point3::from(pose.position);
        self.rotation = pose.rotation;
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position.coords,
            rotation: self.rotation,
        }
    }

    /// The 8 corners in world space
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let h = self.size * 0.5;
        let local = [
            Vector3::new(-h.x, -h.y, -h.z),
            Vector3::new(h.x, -h.y, -h.z),
            Vector3::new(h.x, h.y, -h.z),
            Vector3::new(-h.x, h.y, -h.z),
            Vector3::new(-h.x, -h.y, h.z),
            Vector3::new(h.x, -h.y, h.z),
            Vector3::new(h.x, h.y, h.z),
            Vector3::new(-h.x, h.y, h.z),
        ];
        local.map(|corner| self.position + self.rotation * corner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [u8; 4],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [u8; 4],
    pub intensity: f32,
    pub position: Point3<f32>,
    pub cast_shadow: bool,
}

/// Render-side state: meshes, lights and the background color
#[derive(Debug, Clone)]
pub struct Scene {
    pub clear_color: [u8; 4],
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    objects: Vec<RenderObject>,
}

impl Scene {
    /// Empty scene with the default sky color and lights
    pub fn new() -> Self {
        Self {
            clear_color: rgba(0xbfd1e5),
            ambient: AmbientLight {
                color: rgba(0xdedede),
                intensity: 0.8,
            },
            directional: DirectionalLight {
                color: rgba(0xffffff),
                intensity: 0.5,
                position: Point3::new(-10.0, 1.0, 5.0),
                cast_shadow: true,
            },
            objects: Vec::new(),
        }
    }

    pub fn add(&mut self, object: RenderObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&RenderObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.objects.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.name == name).map(ObjectId)
    }

    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// At least one pixel each way, so the aspect ratio stays finite
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
