use copter::{Direction, RotorGroup, ScenarioConfig, Simulation, Viewport};
use std::path::PathBuf;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("scenarios")
        .join(name)
}

#[test]
fn bundled_scenario_file_loads_and_runs() {
    let config = ScenarioConfig::load(scenario_path("hover-test.toml")).unwrap();
    assert_eq!(config.name, "hover-test");
    assert_eq!(config.rotors.len(), 2);
    assert_eq!(config.rotors[0].direction, Direction::Left);
    assert_eq!(config.rotors[1].group, RotorGroup::Rear);
    assert_eq!(config.camera.follow_offset, [0.0, 8.0, 8.0]);

    let mut sim = Simulation::new(config, Viewport { width: 64, height: 48 }).unwrap();
    assert_eq!(sim.world().dynamic_objects().len(), 3);
    for _ in 0..10 {
        sim.tick(1.0 / 60.0);
    }
    assert_eq!(sim.frame_count(), 10);
}

#[test]
fn scenario_without_focus_keeps_the_camera_still() {
    let mut config = ScenarioConfig::ramp();
    config.focus = None;
    let mut sim = Simulation::new(config, Viewport { width: 64, height: 48 }).unwrap();
    let before = sim.world().camera.position;
    for _ in 0..10 {
        sim.tick(1.0 / 60.0);
    }
    assert_eq!(sim.world().camera.position, before);
    assert!(sim.focus_pose().is_none());
}

#[test]
fn unknown_focus_is_rejected() {
    let mut config = ScenarioConfig::quadcopter();
    config.focus = Some("ghost".to_string());
    assert!(Simulation::new(config, Viewport { width: 64, height: 48 }).is_err());
}
