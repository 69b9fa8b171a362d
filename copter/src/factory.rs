use crate::physics::{PhysicsWorld, Pose};
use crate::world::World;
use crate::{BodyConfig, Material, ObjectId, RenderObject};
use rapier3d::na::{Point3, Vector3};
use rapier3d::prelude::{nalgebra, vector};

/// Create a box mesh and its rigid body at `config`'s pose.
/// Bodies with mass join the dynamic list and never sleep; massless ones are static.
pub fn create_parallelepiped(world: &mut World, physics: &mut PhysicsWorld, config: &BodyConfig) -> ObjectId {
    create_parallelepiped_at(world, physics, config, Pose::new(config.position, config.rotation))
}

/// Same as [`create_parallelepiped`] with an explicit pose
pub fn create_parallelepiped_at(
    world: &mut World,
    physics: &mut PhysicsWorld,
    config: &BodyConfig,
    pose: Pose,
) -> ObjectId {
    let [sx, sy, sz] = config.size;
    let body = physics.add_box(vector![sx * 0.5, sy * 0.5, sz * 0.5], config.mass, pose);

    let id = world.scene.add(RenderObject {
        name: config.name.clone(),
        size: Vector3::new(sx, sy, sz),
        position: Point3::from(pose.position),
        rotation: pose.rotation,
        material: Material::from(&config.material),
        cast_shadow: config.cast_shadow,
        receive_shadow: config.receive_shadow,
        body: Some(body),
    });

    if config.mass > 0.0 {
        world.register_dynamic(id);
    }
    log::debug!("Created {} ({sx}x{sy}x{sz}, {}kg)", config.name, config.mass);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraConfig, MaterialConfig, PhysicsConfig, Viewport};

    fn body(name: &str, mass: f32) -> BodyConfig {
        BodyConfig {
            name: name.to_string(),
            size: [2.0, 1.0, 2.0],
            mass,
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            material: MaterialConfig::solid(0x112233),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    #[test]
    fn massive_bodies_are_dynamic() {
        let mut world = World::new(&CameraConfig::default(), Viewport { width: 32, height: 24 });
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());

        let ground = create_parallelepiped(&mut world, &mut physics, &body("ground", 0.0));
        let block = create_parallelepiped(&mut world, &mut physics, &body("block", 4.0));

        assert_eq!(world.dynamic_objects(), &[block]);
        let ground = world.scene.get(ground).unwrap();
        assert!(!physics.is_dynamic(ground.body.unwrap()));
        let block = world.scene.get(block).unwrap();
        assert!(physics.is_dynamic(block.body.unwrap()));
        assert_eq!(block.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(block.material.color, [0x11, 0x22, 0x33, 255]);
        assert_eq!(physics.body_count(), 2);
    }
}
