use crate::PhysicsConfig;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

const STEP_EPSILON: f32 = 1e-4;

/// Initial pose of a body: translation plus [x, y, z, w] rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: [f32; 3], rotation: [f32; 4]) -> Self {
        let [x, y, z, w] = rotation;
        Self {
            position: vector![position[0], position[1], position[2]],
            rotation: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// Wrapper around the Rapier pipeline
/// - fixed internal timestep, wall-clock time consumed through an accumulator
/// - box bodies, hinge joints with angular motors
/// - physics in SI units (meters, seconds, newtons)
pub struct PhysicsWorld {
    gravity: Vector<f32>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    fixed_timestep: f32,
    max_substeps: u32,
    restitution: f32,
    accumulator: f32,
}

impl PhysicsWorld {
    /// Create an empty world with the configured gravity
    pub fn new(config: &PhysicsConfig) -> Self {
        let [gx, gy, gz] = config.gravity;
        log::debug!(
            "Physics world: gravity=({gx},{gy},{gz}) step={}s substeps<={}",
            config.fixed_timestep,
            config.max_substeps
        );
        Self {
            gravity: vector![gx, gy, gz],
            integration_parameters: IntegrationParameters {
                dt: config.fixed_timestep,
                ..Default::default()
            },
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            fixed_timestep: config.fixed_timestep,
            max_substeps: config.max_substeps,
            restitution: config.restitution,
            accumulator: 0.0,
        }
    }

    /// Insert a box body with half extents `half`. Mass <= 0 gives a fixed body,
    /// anything heavier is dynamic and never falls asleep.
    pub fn add_box(&mut self, half: Vector<f32>, mass: f32, pose: Pose) -> RigidBodyHandle {
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic().can_sleep(false)
        } else {
            RigidBodyBuilder::fixed()
        };
        let mut rb = builder.translation(pose.position).build();
        rb.set_rotation(pose.rotation, false);
        let handle = self.bodies.insert(rb);

        let mut collider = ColliderBuilder::cuboid(half.x, half.y, half.z).restitution(self.restitution);
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);
        handle
    }

    /// Pin `child` to `parent` with a hinge around +Y.
    /// Pivots are expressed in each body's local frame; the linked bodies do not collide.
    pub fn add_hinge(
        &mut self,
        parent: RigidBodyHandle,
        child: RigidBodyHandle,
        parent_pivot: Point<f32>,
        child_pivot: Point<f32>,
    ) -> ImpulseJointHandle {
        let hinge = RevoluteJointBuilder::new(Vector::y_axis())
            .local_anchor1(parent_pivot)
            .local_anchor2(child_pivot)
            .contacts_enabled(false)
            .build();
        self.impulse_joints.insert(parent, child, hinge, true)
    }

    /// Drive a hinge motor toward `target_velocity` rad/s
    pub fn set_hinge_motor(&mut self, hinge: ImpulseJointHandle, target_velocity: f32, damping: f32, max_force: f32) {
        if let Some(joint) = self.impulse_joints.get_mut(hinge, true) {
            joint
                .data
                .set_motor_velocity(JointAxis::AngX, target_velocity, damping)
                .set_motor_max_force(JointAxis::AngX, max_force);
        }
    }

    /// Current motor target of a hinge, if it exists
    pub fn hinge_motor_velocity(&self, hinge: ImpulseJointHandle) -> Option<f32> {
        self.impulse_joints
            .get(hinge)
            .and_then(|joint| joint.data.motor(JointAxis::AngX))
            .map(|motor| motor.target_vel)
    }

    /// Drop forces added during the previous frame
    pub fn reset_forces(&mut self, handle: RigidBodyHandle) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.reset_forces(true);
        }
    }

    /// Apply `force` (world frame) at `point` (world frame) until the next reset
    pub fn apply_force_at(&mut self, handle: RigidBodyHandle, force: Vector<f32>, point: Point<f32>) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.add_force_at_point(force, point, true);
        }
    }

    /// Consume `elapsed` seconds of wall-clock time in fixed internal steps.
    /// Time left over is carried to the next call, time beyond the substep cap is dropped.
    /// Returns the number of internal steps taken.
    pub fn step(&mut self, elapsed: f32) -> u32 {
        if elapsed > 0.0 {
            self.accumulator += elapsed;
        }
        // tolerate rounding when elapsed is an exact multiple of the step
        let available = (self.accumulator / self.fixed_timestep + STEP_EPSILON).floor() as u32;
        self.accumulator = (self.accumulator - available as f32 * self.fixed_timestep).max(0.0);
        let steps = available.min(self.max_substeps);
        if available > steps {
            log::trace!("Dropping {} physics steps", available - steps);
        }

        self.integration_parameters.dt = self.fixed_timestep;
        for _ in 0..steps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &(),
                &(),
            );
        }
        steps
    }

    /// World pose of a body
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<Pose> {
        self.bodies.get(handle).map(|rb| Pose {
            position: *rb.translation(),
            rotation: *rb.rotation(),
        })
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vector<f32>> {
        self.bodies.get(handle).map(|rb| *rb.linvel())
    }

    pub fn angular_velocity(&self, handle: RigidBodyHandle) -> Option<Vector<f32>> {
        self.bodies.get(handle).map(|rb| *rb.angvel())
    }

    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).is_some_and(|rb| rb.is_dynamic())
    }

    pub fn mass(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.bodies.get(handle).map(|rb| rb.mass())
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&PhysicsConfig::default())
    }

    #[test]
    fn zero_elapsed_takes_no_step() {
        let mut physics = world();
        let body = physics.add_box(vector![0.5, 0.5, 0.5], 1.0, Pose::new([0.0, 5.0, 0.0], [0.0, 0.0, 0.0, 1.0]));
        for _ in 0..10 {
            assert_eq!(physics.step(0.0), 0);
        }
        assert_eq!(physics.pose(body).unwrap().position, vector![0.0, 5.0, 0.0]);
    }

    #[test]
    fn substeps_are_capped() {
        let mut physics = world();
        assert_eq!(physics.step(1.0), 10);
        // the excess second was dropped, not queued
        assert_eq!(physics.step(0.0), 0);
    }

    #[test]
    fn leftover_time_carries_over() {
        let mut physics = world();
        let dt = 1.0 / 60.0;
        assert_eq!(physics.step(dt * 0.6), 0);
        assert_eq!(physics.step(dt * 0.6), 1);
    }

    #[test]
    fn dynamic_body_falls_static_body_stays() {
        let mut physics = world();
        let ground = physics.add_box(vector![5.0, 0.5, 5.0], 0.0, Pose::new([0.0, -0.5, 0.0], [0.0, 0.0, 0.0, 1.0]));
        let block = physics.add_box(vector![0.5, 0.5, 0.5], 2.0, Pose::new([0.0, 10.0, 0.0], [0.0, 0.0, 0.0, 1.0]));
        physics.step(0.5);
        assert!(physics.pose(block).unwrap().position.y < 10.0);
        assert_eq!(physics.pose(ground).unwrap().position, vector![0.0, -0.5, 0.0]);
        assert!(physics.is_dynamic(block));
        assert!(!physics.is_dynamic(ground));
        assert!((physics.mass(block).unwrap() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn hinge_motor_target_is_stored() {
        let mut physics = world();
        let frame = physics.add_box(vector![1.5, 0.05, 1.5], 30.0, Pose::identity());
        let rotor = physics.add_box(vector![0.75, 0.05, 0.05], 1.0, Pose::new([1.9, 0.05, 1.9], [0.0, 0.0, 0.0, 1.0]));
        let hinge = physics.add_hinge(frame, rotor, point![1.9, 0.05, 1.9], point![0.0, -0.05, 0.0]);
        physics.set_hinge_motor(hinge, -45.0, 1.0, 1.0);
        assert_eq!(physics.hinge_motor_velocity(hinge), Some(-45.0));
        assert_eq!(physics.joint_count(), 1);
    }
}
