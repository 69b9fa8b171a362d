use crate::factory::create_parallelepiped;
use crate::physics::{PhysicsWorld, Pose};
use crate::rotor::attach_rotor;
use crate::world::World;
use crate::{
    Clock, CopterError, InputController, InputEvent, ObjectId, PixelBuffer, Presenter, Result, Rotor,
    ScenarioConfig, Scene, Viewport,
};
use rapier3d::na::Point3;
use std::collections::HashMap;

/// Where the frame loop currently is. Outside of [`Simulation::tick`] it is always Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    PhysicsStep,
    StateSync,
    Render,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub elapsed: f32,
    pub physics_steps: u32,
}

/// Exit condition for [`Simulation::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimit {
    pub max_frames: Option<u64>,
}

impl RunLimit {
    pub fn frames(max_frames: u64) -> Self {
        Self {
            max_frames: Some(max_frames),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    fn reached(&self, frames: u64) -> bool {
        self.max_frames.is_some_and(|max| frames >= max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub physics_steps: u64,
    pub elapsed: f32,
}

/// Everything one running scenario owns: scene, physics, rotors and input state.
/// Frontends hold one of these and feed it time and key presses.
pub struct Simulation {
    config: ScenarioConfig,
    world: World,
    physics: PhysicsWorld,
    rotors: Vec<Rotor>,
    input: InputController,
    focus: Option<ObjectId>,
    phase: FramePhase,
    frames: u64,
}

impl Simulation {
    /// Build the scene and physics world for `config`
    pub fn new(config: ScenarioConfig, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        if viewport.width == 0 || viewport.height == 0 {
            log::warn!("Viewport {}x{} has no area, using at least 1x1", viewport.width, viewport.height);
        }
        let viewport = viewport.clamped();

        let mut world = World::new(&config.camera, viewport);
        let mut physics = PhysicsWorld::new(&config.physics);

        let mut ids = HashMap::new();
        for body in &config.bodies {
            let id = create_parallelepiped(&mut world, &mut physics, body);
            ids.insert(body.name.as_str(), id);
        }

        let mut rotors = Vec::with_capacity(config.rotors.len());
        for rotor in &config.rotors {
            let parent = ids.get(rotor.parent.as_str()).copied().ok_or_else(|| CopterError::UnknownParent {
                rotor: rotor.name.clone(),
                parent: rotor.parent.clone(),
            })?;
            rotors.push(attach_rotor(&mut world, &mut physics, rotor, parent)?);
        }

        let focus = match &config.focus {
            Some(name) => Some(
                ids.get(name.as_str())
                    .copied()
                    .ok_or_else(|| CopterError::UnknownFocus { name: name.clone() })?,
            ),
            None => None,
        };
        drop(ids);

        log::info!(
            "Scenario {}: {} objects, {} rotors, lift {}",
            config.name,
            world.scene.len(),
            rotors.len(),
            if config.lift { "on" } else { "off" }
        );

        Ok(Self {
            config,
            world,
            physics,
            rotors,
            input: InputController::new(),
            focus,
            phase: FramePhase::Idle,
            frames: 0,
        })
    }

    /// Route a frontend event. Returns false for events the simulation ignores.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::KeyPress(code) => self.key_press(code),
            InputEvent::Resize { width, height } => self.resize(width, height),
            InputEvent::Exit => false,
        }
    }

    /// Keyboard control; returns whether the key was recognised
    pub fn key_press(&mut self, code: u32) -> bool {
        self.input.handle_key(code, &mut self.rotors)
    }

    /// Window resize: camera aspect and renderer size follow the new surface
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let resized = self.world.resize(width, height);
        if resized {
            log::info!("Viewport resized to {width}x{height}");
        } else {
            log::warn!("Ignoring resize to {width}x{height}");
        }
        resized
    }

    /// One frame: drive rotors, step physics by `elapsed` seconds, copy poses
    /// onto meshes, then render
    pub fn tick(&mut self, elapsed: f32) -> FrameReport {
        self.phase = FramePhase::PhysicsStep;
        self.drive_rotors();
        let physics_steps = self.physics.step(elapsed);

        self.phase = FramePhase::StateSync;
        self.sync_transforms();

        self.phase = FramePhase::Render;
        if let Some(focus) = self.focus_position() {
            self.world.camera.follow(focus);
        }
        self.world.render();

        self.phase = FramePhase::Idle;
        self.frames += 1;
        log::trace!("Frame {}: dt={elapsed:.4}s steps={physics_steps}", self.frames);
        FrameReport { elapsed, physics_steps }
    }

    fn drive_rotors(&mut self) {
        for body in self.world.dynamic_bodies() {
            self.physics.reset_forces(body);
        }
        for rotor in &self.rotors {
            rotor.drive(&mut self.physics, &self.config.physics, self.config.lift);
        }
    }

    fn sync_transforms(&mut self) {
        self.world.sync_from(&self.physics);
    }

    /// Explicit scheduler: tick until the presenter asks to stop or `limit` is reached
    pub fn run<C: Clock, P: Presenter>(&mut self, clock: &mut C, presenter: &mut P, limit: RunLimit) -> Result<RunStats> {
        let mut stats = RunStats::default();
        'frames: while !presenter.should_exit() && !limit.reached(stats.frames) {
            for event in presenter.handle_input() {
                if event == InputEvent::Exit {
                    break 'frames;
                }
                self.handle_event(event);
            }

            let report = self.tick(clock.delta());
            stats.frames += 1;
            stats.physics_steps += u64::from(report.physics_steps);
            stats.elapsed += report.elapsed;

            presenter.present(self.buffer())?;
        }
        log::info!(
            "Stopped after {} frames ({} physics steps, {:.2}s)",
            stats.frames,
            stats.physics_steps,
            stats.elapsed
        );
        Ok(stats)
    }

    pub fn focus_position(&self) -> Option<Point3<f32>> {
        self.focus.and_then(|id| self.world.scene.get(id)).map(|o| o.position)
    }

    /// Pose of the focus body straight from physics
    pub fn focus_pose(&self) -> Option<Pose> {
        self.focus
            .and_then(|id| self.world.scene.get(id))
            .and_then(|o| o.body)
            .and_then(|body| self.physics.pose(body))
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.world.scene
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn rotors(&self) -> &[Rotor] {
        &self.rotors
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn buffer(&self) -> &PixelBuffer {
        self.world.buffer()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedClock, KEY_W};

    const VIEWPORT: Viewport = Viewport { width: 64, height: 48 };

    struct Recorder {
        presented: u64,
        queued: Vec<InputEvent>,
        stop_after: Option<u64>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, buffer: &PixelBuffer) -> Result<()> {
            assert_eq!(buffer.pixels.len(), (buffer.width * buffer.height) as usize);
            self.presented += 1;
            Ok(())
        }

        fn handle_input(&mut self) -> Vec<InputEvent> {
            std::mem::take(&mut self.queued)
        }

        fn should_exit(&self) -> bool {
            self.stop_after.is_some_and(|n| self.presented >= n)
        }
    }

    #[test]
    fn quadcopter_scenario_builds() {
        let sim = Simulation::new(ScenarioConfig::quadcopter(), VIEWPORT).unwrap();
        assert_eq!(sim.scene().len(), 6);
        assert_eq!(sim.rotors().len(), 4);
        assert_eq!(sim.world().dynamic_objects().len(), 5);
        assert_eq!(sim.physics().joint_count(), 4);
        assert_eq!(sim.phase(), FramePhase::Idle);
    }

    #[test]
    fn empty_viewport_still_has_a_finite_aspect() {
        let mut sim = Simulation::new(ScenarioConfig::ramp(), Viewport { width: 64, height: 0 }).unwrap();
        assert!(sim.world().camera.aspect.is_finite());
        assert_eq!(sim.world().viewport(), Viewport { width: 64, height: 1 });
        sim.tick(1.0 / 60.0);
        assert_eq!(sim.buffer().pixels.len(), 64);
    }

    #[test]
    fn duplicate_body_names_do_not_build() {
        let mut config = ScenarioConfig::ramp();
        let mut twin = config.body("block").unwrap().clone();
        twin.position = [0.0, 0.0, 0.0];
        config.bodies.push(twin);
        let err = Simulation::new(config, VIEWPORT).err().unwrap();
        assert!(matches!(err, CopterError::DuplicateBody { name } if name == "block"));
    }

    #[test]
    fn tick_returns_to_idle() {
        let mut sim = Simulation::new(ScenarioConfig::ramp(), VIEWPORT).unwrap();
        let report = sim.tick(1.0 / 60.0);
        assert_eq!(report.physics_steps, 1);
        assert_eq!(sim.phase(), FramePhase::Idle);
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn run_stops_at_frame_limit() {
        let mut sim = Simulation::new(ScenarioConfig::ramp(), VIEWPORT).unwrap();
        let mut presenter = Recorder { presented: 0, queued: Vec::new(), stop_after: None };
        let stats = sim
            .run(&mut FixedClock(1.0 / 60.0), &mut presenter, RunLimit::frames(12))
            .unwrap();
        assert_eq!(stats.frames, 12);
        assert_eq!(stats.physics_steps, 12);
        assert_eq!(presenter.presented, 12);
    }

    #[test]
    fn run_stops_when_presenter_exits() {
        let mut sim = Simulation::new(ScenarioConfig::ramp(), VIEWPORT).unwrap();
        let mut presenter = Recorder { presented: 0, queued: Vec::new(), stop_after: Some(3) };
        let stats = sim.run(&mut FixedClock(0.0), &mut presenter, RunLimit::unbounded()).unwrap();
        assert_eq!(stats.frames, 3);
    }

    #[test]
    fn run_forwards_input_and_honours_exit() {
        let mut sim = Simulation::new(ScenarioConfig::quadcopter(), VIEWPORT).unwrap();
        let mut presenter = Recorder {
            presented: 0,
            queued: vec![InputEvent::KeyPress(KEY_W), InputEvent::Resize { width: 80, height: 40 }],
            stop_after: None,
        };
        let stats = sim.run(&mut FixedClock(0.0), &mut presenter, RunLimit::frames(5)).unwrap();
        assert_eq!(stats.frames, 5);
        assert!(sim.rotors().iter().all(|r| r.power() == 15.0));
        assert_eq!(sim.buffer().width, 80);

        presenter.queued = vec![InputEvent::Exit];
        let stats = sim.run(&mut FixedClock(0.0), &mut presenter, RunLimit::unbounded()).unwrap();
        assert_eq!(stats.frames, 0);
    }
}
