use crate::factory::create_parallelepiped_at;
use crate::physics::{PhysicsWorld, Pose};
use crate::world::World;
use crate::{BodyConfig, CopterError, Direction, MaterialConfig, ObjectId, PhysicsConfig, Result, RotorConfig, RotorGroup};
use rapier3d::na::{Point3, Vector3};
use rapier3d::prelude::*;

pub const ROTOR_SIZE: [f32; 3] = [1.5, 0.1, 0.1];
pub const ROTOR_MASS: f32 = 1.0;
pub const MIN_POWER: f32 = 0.0;
pub const MAX_POWER: f32 = 100.0;

/// A spinning blade hinged to its parent frame
#[derive(Debug, Clone)]
pub struct Rotor {
    pub name: String,
    pub object: ObjectId,
    pub hinge: ImpulseJointHandle,
    pub parent: ObjectId,
    pub parent_body: RigidBodyHandle,
    pub direction: Direction,
    pub group: RotorGroup,
    /// Where lift acts, in the parent's local frame (mount x, 0, mount z)
    pub lift_offset: Vector3<f32>,
    power: f32,
}

impl Rotor {
    pub fn power(&self) -> f32 {
        self.power
    }

    /// Add `delta` to power, clamped to [0, 100]
    pub fn change_power(&mut self, delta: f32) {
        self.power = (self.power + delta).clamp(MIN_POWER, MAX_POWER);
    }

    /// Angular velocity the hinge motor is driven toward
    pub fn motor_target(&self, gain: f32) -> f32 {
        self.direction.sign() * gain * self.power
    }

    /// Lift in the parent's local frame
    pub fn local_lift(&self) -> Vector3<f32> {
        Vector3::new(0.0, self.power, 0.0)
    }

    /// Spin the motor and, when `lift` is on, push the parent up along its own
    /// up axis at the mount point
    pub fn drive(&self, physics: &mut PhysicsWorld, params: &PhysicsConfig, lift: bool) {
        physics.set_hinge_motor(
            self.hinge,
            self.motor_target(params.motor_gain),
            params.motor_damping,
            params.motor_max_force,
        );

        if !lift {
            return;
        }
        let Some(frame) = physics.pose(self.parent_body) else {
            return;
        };
        let force = frame.rotation * self.local_lift();
        let point = Point3::from(frame.position + frame.rotation * self.lift_offset);
        physics.apply_force_at(self.parent_body, force, point);
    }
}

/// Create a rotor at `config.offset` on `parent` and hinge it there around +Y
pub fn attach_rotor(
    world: &mut World,
    physics: &mut PhysicsWorld,
    config: &RotorConfig,
    parent: ObjectId,
) -> Result<Rotor> {
    let (parent_pose, parent_body) = match world.scene.get(parent) {
        Some(object) => match object.body {
            Some(body) => (object.pose(), body),
            None => {
                return Err(CopterError::NoPhysicsBody {
                    name: object.name.clone(),
                });
            }
        },
        None => {
            return Err(CopterError::UnknownParent {
                rotor: config.name.clone(),
                parent: config.parent.clone(),
            });
        }
    };

    let [x, y, z] = config.offset;
    let mount = Vector3::new(x, y, z);
    let pose = Pose {
        position: parent_pose.position + parent_pose.rotation * mount,
        rotation: parent_pose.rotation,
    };
    let body_config = BodyConfig {
        name: format!("rotor{}", config.name),
        size: ROTOR_SIZE,
        mass: ROTOR_MASS,
        position: [pose.position.x, pose.position.y, pose.position.z],
        rotation: [0.0, 0.0, 0.0, 1.0],
        material: MaterialConfig::solid(0x000000),
        cast_shadow: true,
        receive_shadow: false,
    };
    let object = create_parallelepiped_at(world, physics, &body_config, pose);
    let rotor_body = world
        .scene
        .get(object)
        .and_then(|o| o.body)
        .ok_or_else(|| CopterError::NoPhysicsBody {
            name: body_config.name.clone(),
        })?;

    let hinge = physics.add_hinge(
        parent_body,
        rotor_body,
        point![x, y, z],
        point![0.0, -ROTOR_SIZE[1] * 0.5, 0.0],
    );
    log::debug!("Attached rotor {} to {} at ({x}, {y}, {z})", config.name, config.parent);

    Ok(Rotor {
        name: config.name.clone(),
        object,
        hinge,
        parent,
        parent_body,
        direction: config.direction,
        group: config.group,
        lift_offset: Vector3::new(x, 0.0, z),
        power: MIN_POWER,
    })
}

#[cfg(test)]
pub(crate) fn detached_rotor(name: &str, group: RotorGroup) -> Rotor {
    Rotor {
        name: name.to_string(),
        object: ObjectId(0),
        hinge: ImpulseJointHandle::invalid(),
        parent: ObjectId(0),
        parent_body: RigidBodyHandle::invalid(),
        direction: Direction::Right,
        group,
        lift_offset: Vector3::zeros(),
        power: MIN_POWER,
    }
}
