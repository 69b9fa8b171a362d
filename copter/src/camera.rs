use crate::CameraConfig;
use rapier3d::na::{Matrix4, Point3, Vector3, Vector4};

/// Perspective camera that trails the focus body at a fixed offset
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,    // Vertical field of view in radians
    pub aspect: f32, // Width / height
    pub near: f32,
    pub far: f32,
    pub follow_offset: Vector3<f32>,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let [px, py, pz] = config.position;
        let [tx, ty, tz] = config.look_at;
        let [ox, oy, oz] = config.follow_offset;
        Self {
            position: Point3::new(px, py, pz),
            target: Point3::new(tx, ty, tz),
            up: Vector3::y(),
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
            follow_offset: Vector3::new(ox, oy, oz),
        }
    }

    /// Move behind and above `focus`, looking at it
    pub fn follow(&mut self, focus: Point3<f32>) {
        self.position = focus + self.follow_offset;
        self.target = focus;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn get_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn get_projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn get_view_projection_matrix(&self) -> Matrix4<f32> {
        self.get_projection_matrix() * self.get_view_matrix()
    }
}

/// Convert 3D world coordinates to 2D screen coordinates
/// Returns (x, y, depth) with x,y in pixels (may lie off screen) and depth in NDC
/// Returns None if the point is behind the camera
pub fn world_to_screen(
    world_pos: Point3<f32>,
    view_projection: &Matrix4<f32>,
    screen_width: u32,
    screen_height: u32,
) -> Option<(f32, f32, f32)> {
    let clip_space = view_projection * world_pos.to_homogeneous();

    if clip_space.w <= 0.0 {
        return None;
    }

    let (screen_x, screen_y) = clip_to_screen(&clip_space, screen_width, screen_height);
    Some((screen_x, screen_y, clip_space.z / clip_space.w))
}

/// Perspective divide and viewport transform of a clip-space point with w > 0
pub fn clip_to_screen(clip_space: &Vector4<f32>, screen_width: u32, screen_height: u32) -> (f32, f32) {
    let ndc_x = clip_space.x / clip_space.w;
    let ndc_y = clip_space.y / clip_space.w;

    let screen_x = (ndc_x + 1.0) * 0.5 * screen_width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * screen_height as f32; // Flip Y axis
    (screen_x, screen_y)
}
