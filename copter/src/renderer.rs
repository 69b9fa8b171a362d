use crate::{Camera, PixelBuffer, RenderObject, Scene, Viewport, clip_to_screen};
use rapier3d::na::{Matrix4, Point3, Vector3};

/// Box edges as corner index pairs, matching [`RenderObject::corners`]
const EDGES: [(usize, usize); 12] = [
    // Back face
    (0, 1), (1, 2), (2, 3), (3, 0),
    // Front face
    (4, 5), (5, 6), (6, 7), (7, 4),
    // Connecting edges
    (0, 4), (1, 5), (2, 6), (3, 7),
];

const MIN_W: f32 = 1e-3;
/// Casters may sink this far into a receiver and still throw a shadow on it
const SHADOW_TOLERANCE: f32 = 0.1;

/// Software wireframe renderer drawing a [`Scene`] into a [`PixelBuffer`]
pub struct Renderer {
    pub buffer: PixelBuffer,
}

impl Renderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            buffer: PixelBuffer::new(viewport.width, viewport.height),
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.buffer.resize(width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.buffer.width, self.buffer.height)
    }

    /// Render current frame to the pixel buffer
    pub fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.buffer.clear(scene.clear_color);

        let view_proj = camera.get_view_projection_matrix();
        // the directional light shines from its position toward the origin
        let to_light = scene.directional.position.coords.try_normalize(f32::EPSILON);

        for object in scene.objects() {
            let color = shade(object.material.color, light_factor(scene, object, to_light.as_ref()));
            if let Some(repeat) = object.material.grid_repeat {
                self.render_grid(&view_proj, object, repeat, darken(color));
            }
            self.render_box(&view_proj, object, color);
        }

        if let Some(to_light) = to_light.filter(|_| scene.directional.cast_shadow) {
            self.render_shadows(&view_proj, scene, &to_light);
        }
    }

    /// Outline of each caster projected along the light onto the top face of each receiver
    fn render_shadows(&mut self, view_proj: &Matrix4<f32>, scene: &Scene, to_light: &Vector3<f32>) {
        for (r, receiver) in scene.objects().iter().enumerate() {
            if !receiver.receive_shadow {
                continue;
            }
            let normal = receiver.rotation * Vector3::y();
            let facing = normal.dot(to_light);
            if facing <= f32::EPSILON {
                continue;
            }
            let top = receiver.position + normal * (receiver.size.y * 0.5);
            let color = darken(shade(receiver.material.color, light_factor(scene, receiver, Some(to_light))));

            for (c, caster) in scene.objects().iter().enumerate() {
                if c == r || !caster.cast_shadow {
                    continue;
                }
                let corners = caster.corners();
                if corners.iter().any(|p| (p - top).dot(&normal) < -SHADOW_TOLERANCE) {
                    continue;
                }
                let projected = corners.map(|p| p - to_light * ((p - top).dot(&normal) / facing));
                for (start, end) in EDGES {
                    self.render_segment(view_proj, projected[start], projected[end], color);
                }
            }
        }
    }

    fn render_box(&mut self, view_proj: &Matrix4<f32>, object: &RenderObject, color: [u8; 4]) {
        let corners = object.corners();
        for (start, end) in EDGES {
            self.render_segment(view_proj, corners[start], corners[end], color);
        }
    }

    /// Grid texture over the top face, `repeat` cells per side
    fn render_grid(&mut self, view_proj: &Matrix4<f32>, object: &RenderObject, repeat: u32, color: [u8; 4]) {
        let c = object.corners();
        // Top face corners: 3 -> 2 along +X, 3 -> 7 along +Z
        let (origin, along_x, along_z) = (c[3], c[2] - c[3], c[7] - c[3]);
        for i in 1..repeat {
            let t = i as f32 / repeat as f32;
            self.render_segment(view_proj, origin + along_z * t, origin + along_z * t + along_x, color);
            self.render_segment(view_proj, origin + along_x * t, origin + along_x * t + along_z, color);
        }
    }

    /// Clip against the near side of the camera in clip space, then project
    fn render_segment(&mut self, view_proj: &Matrix4<f32>, start: Point3<f32>, end: Point3<f32>, color: [u8; 4]) {
        let mut a = view_proj * start.to_homogeneous();
        let mut b = view_proj * end.to_homogeneous();
        if a.w < MIN_W && b.w < MIN_W {
            return;
        }
        if a.w < MIN_W {
            a = a + (b - a) * ((MIN_W - a.w) / (b.w - a.w));
        } else if b.w < MIN_W {
            b = b + (a - b) * ((MIN_W - b.w) / (a.w - b.w));
        }

        let (w, h) = self.size();
        let (ax, ay) = clip_to_screen(&a, w, h);
        let (bx, by) = clip_to_screen(&b, w, h);
        self.buffer
            .draw_line(ax as i32, ay as i32, bx as i32, by as i32, color);
    }
}

/// Ambient plus the directional share hitting the object's top face
fn light_factor(scene: &Scene, object: &RenderObject, to_light: Option<&Vector3<f32>>) -> f32 {
    let facing = to_light.map_or(0.0, |l| (object.rotation * Vector3::y()).dot(l).max(0.0));
    (scene.ambient.intensity + scene.directional.intensity * facing).min(1.0)
}

fn shade(color: [u8; 4], light: f32) -> [u8; 4] {
    let scale = |c: u8| (c as f32 * light).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

fn darken(color: [u8; 4]) -> [u8; 4] {
    shade(color, 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraConfig, Material};
    use rapier3d::na::UnitQuaternion;

    fn cube() -> RenderObject {
        RenderObject {
            name: "cube".into(),
            size: Vector3::new(2.0, 2.0, 2.0),
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            material: Material { color: [0, 0, 0, 255], grid_repeat: None },
            cast_shadow: false,
            receive_shadow: false,
            body: None,
        }
    }

    #[test]
    fn empty_scene_is_clear_color() {
        let scene = Scene::new();
        let camera = Camera::new(&CameraConfig::default(), 4.0 / 3.0);
        let mut renderer = Renderer::new(Viewport { width: 32, height: 24 });
        renderer.render(&scene, &camera);
        assert!(renderer.buffer.pixels.iter().all(|p| *p == scene.clear_color));
    }

    #[test]
    fn box_edges_are_drawn() {
        let mut scene = Scene::new();
        scene.add(cube());
        let camera = Camera::new(&CameraConfig::default(), 4.0 / 3.0);
        let mut renderer = Renderer::new(Viewport { width: 320, height: 240 });
        renderer.render(&scene, &camera);
        assert!(renderer.buffer.pixels.iter().any(|p| *p == [0, 0, 0, 255]));
    }

    fn overhead_scene() -> Scene {
        let mut scene = Scene::new();
        scene.directional.position = Point3::new(0.0, 10.0, 0.0);
        scene
    }

    #[test]
    fn faces_toward_the_light_are_brighter() {
        let scene = overhead_scene();
        let up = cube();
        let flipped = RenderObject {
            rotation: UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI),
            ..cube()
        };
        let l = scene.directional.position.coords.normalize();
        assert_eq!(light_factor(&scene, &up, Some(&l)), 1.0);
        assert!((light_factor(&scene, &flipped, Some(&l)) - 0.8).abs() < 1e-5);
        assert!((light_factor(&scene, &up, None) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn shadows_need_a_caster_and_a_receiver() {
        let render = |caster_casts: bool, light_casts: bool| {
            let mut scene = overhead_scene();
            scene.directional.cast_shadow = light_casts;
            scene.add(RenderObject {
                name: "ground".into(),
                size: Vector3::new(20.0, 1.0, 20.0),
                position: Point3::new(0.0, -0.5, 0.0),
                material: Material { color: [255, 255, 255, 255], grid_repeat: None },
                receive_shadow: true,
                ..cube()
            });
            scene.add(RenderObject {
                position: Point3::new(0.0, 3.0, 0.0),
                cast_shadow: caster_casts,
                ..cube()
            });
            let camera = Camera::new(&CameraConfig::default(), 4.0 / 3.0);
            let mut renderer = Renderer::new(Viewport { width: 320, height: 240 });
            renderer.render(&scene, &camera);
            renderer.buffer.pixels
        };

        let plain = render(false, true);
        assert_ne!(render(true, true), plain);
        assert_eq!(render(true, false), plain);
        // the shadow is the ground color, darkened
        assert!(render(true, true).contains(&[153, 153, 153, 255]));
        assert!(!plain.contains(&[153, 153, 153, 255]));
    }

    #[test]
    fn shading_scales_and_keeps_alpha() {
        assert_eq!(shade([200, 100, 0, 255], 0.5), [100, 50, 0, 255]);
        assert_eq!(shade([200, 100, 0, 255], 1.0), [200, 100, 0, 255]);
    }
}
