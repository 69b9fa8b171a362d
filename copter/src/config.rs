use crate::{CopterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Names accepted by [`ScenarioConfig::preset`]
pub const PRESET_NAMES: [&str; 4] = ["quadcopter", "ramp", "rotor-arm", "rotor-frame"];

const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const ROTOR_PADDING: f32 = 0.1;

/// Surface description shared by a render object's edges and faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// 0xRRGGBB
    pub color: u32,
    /// Repeat count of a grid texture drawn over the top face
    #[serde(default)]
    pub grid_repeat: Option<u32>,
}

impl MaterialConfig {
    pub fn solid(color: u32) -> Self {
        Self { color, grid_repeat: None }
    }
}

/// One box-shaped body of a scenario. Zero mass makes it static.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    pub size: [f32; 3],
    pub mass: f32,
    #[serde(default)]
    pub position: [f32; 3],
    /// Quaternion as [x, y, z, w]
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    pub material: MaterialConfig,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Spin sign applied to the hinge motor
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Which pitch key trims this rotor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotorGroup {
    Front,
    Rear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotorConfig {
    pub name: String,
    pub parent: String,
    /// Mount point in the parent's local frame
    pub offset: [f32; 3],
    pub direction: Direction,
    pub group: RotorGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    /// Internal step used to consume elapsed wall-clock time
    pub fixed_timestep: f32,
    pub max_substeps: u32,
    pub restitution: f32,
    /// Motor target velocity = direction * motor_gain * power
    pub motor_gain: f32,
    pub motor_max_force: f32,
    pub motor_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.8, 0.0],
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 10,
            restitution: 0.1,
            motor_gain: 1.5,
            motor_max_force: 1.0,
            motor_damping: 1.0,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(CopterError::InvalidPhysics {
                field: "fixed_timestep",
                value: self.fixed_timestep.to_string(),
            });
        }
        if self.max_substeps == 0 {
            return Err(CopterError::InvalidPhysics {
                field: "max_substeps",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    /// Camera position relative to the focus body while following it
    pub follow_offset: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.2,
            far: 2000.0,
            position: [0.0, 15.0, 15.0],
            look_at: [0.0, 0.0, 0.0],
            follow_offset: [0.0, 14.0, 14.0],
        }
    }
}

/// Everything needed to build a [`crate::Simulation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub rotors: Vec<RotorConfig>,
    /// Body the camera follows and whose orientation steers rotor lift
    #[serde(default)]
    pub focus: Option<String>,
    /// Apply rotor lift to the parent frame, or only spin the motors
    #[serde(default = "default_lift")]
    pub lift: bool,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

fn identity_rotation() -> [f32; 4] {
    IDENTITY_ROTATION
}

fn default_lift() -> bool {
    true
}

impl ScenarioConfig {
    /// Look up a built-in scenario by name
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "quadcopter" => Ok(Self::quadcopter()),
            "ramp" => Ok(Self::ramp()),
            "rotor-arm" => Ok(Self::rotor_arm()),
            "rotor-frame" => Ok(Self::rotor_frame()),
            _ => Err(CopterError::UnknownScenario { name: name.to_string() }),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| CopterError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loading scenario from {}", path.display());
        Self::from_toml_str(&source)
    }

    /// Body names are unique, every rotor parent and the focus name one of them,
    /// and the physics step can consume time
    pub fn validate(&self) -> Result<()> {
        self.physics.validate()?;
        let mut names = HashSet::new();
        for body in &self.bodies {
            if !names.insert(body.name.as_str()) {
                return Err(CopterError::DuplicateBody { name: body.name.clone() });
            }
        }
        for rotor in &self.rotors {
            if self.body(&rotor.parent).is_none() {
                return Err(CopterError::UnknownParent {
                    rotor: rotor.name.clone(),
                    parent: rotor.parent.clone(),
                });
            }
        }
        if let Some(focus) = &self.focus {
            if self.body(focus).is_none() {
                return Err(CopterError::UnknownFocus { name: focus.clone() });
            }
        }
        Ok(())
    }

    pub fn body(&self, name: &str) -> Option<&BodyConfig> {
        self.bodies.iter().find(|body| body.name == name)
    }

    /// Full quadcopter: 30kg frame, four rotors, lift enabled
    pub fn quadcopter() -> Self {
        let reach = 2.0 - ROTOR_PADDING;
        Self {
            name: "quadcopter".to_string(),
            bodies: vec![ground(), frame()],
            rotors: vec![
                rotor("BL", [-reach, 0.05, reach], Direction::Left, RotorGroup::Rear),
                rotor("BR", [-reach, 0.05, -reach], Direction::Right, RotorGroup::Rear),
                rotor("FR", [reach, 0.05, -reach], Direction::Left, RotorGroup::Front),
                rotor("FL", [reach, 0.05, reach], Direction::Right, RotorGroup::Front),
            ],
            focus: Some("quadcopter".to_string()),
            lift: true,
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
        }
    }

    /// Same frame and rotors as the quadcopter, motors spin but produce no lift
    pub fn rotor_frame() -> Self {
        Self {
            name: "rotor-frame".to_string(),
            lift: false,
            ..Self::quadcopter()
        }
    }

    /// A single rotor on a light arm
    pub fn rotor_arm() -> Self {
        let arm = BodyConfig {
            name: "arm".to_string(),
            size: [3.0, 0.1, 0.3],
            mass: 10.0,
            position: [0.0, 0.0, 0.0],
            rotation: IDENTITY_ROTATION,
            material: MaterialConfig::solid(0x8fc49d),
            cast_shadow: true,
            receive_shadow: false,
        };
        Self {
            name: "rotor-arm".to_string(),
            bodies: vec![ground(), arm],
            rotors: vec![RotorConfig {
                name: "R".to_string(),
                parent: "arm".to_string(),
                offset: [1.4, 0.05, 0.0],
                direction: Direction::Right,
                group: RotorGroup::Front,
            }],
            focus: Some("arm".to_string()),
            lift: true,
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
        }
    }

    /// A crate sliding down a tilted static ramp
    pub fn ramp() -> Self {
        // 20 degrees about +Z
        let half_angle = 10.0_f32.to_radians();
        let ramp = BodyConfig {
            name: "ramp".to_string(),
            size: [10.0, 0.5, 4.0],
            mass: 0.0,
            position: [0.0, 2.0, 0.0],
            rotation: [0.0, 0.0, half_angle.sin(), half_angle.cos()],
            material: MaterialConfig::solid(0xb08d57),
            cast_shadow: true,
            receive_shadow: true,
        };
        let block = BodyConfig {
            name: "block".to_string(),
            size: [1.0, 1.0, 1.0],
            mass: 5.0,
            position: [3.5, 5.0, 0.0],
            rotation: IDENTITY_ROTATION,
            material: MaterialConfig::solid(0x8fc49d),
            cast_shadow: true,
            receive_shadow: false,
        };
        Self {
            name: "ramp".to_string(),
            bodies: vec![ground(), ramp, block],
            rotors: Vec::new(),
            focus: Some("block".to_string()),
            lift: false,
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

fn ground() -> BodyConfig {
    BodyConfig {
        name: "ground".to_string(),
        size: [180.0, 1.0, 180.0],
        mass: 0.0,
        position: [0.0, -0.5, 0.0],
        rotation: IDENTITY_ROTATION,
        material: MaterialConfig {
            color: 0xffffff,
            grid_repeat: Some(40),
        },
        cast_shadow: true,
        receive_shadow: true,
    }
}

fn frame() -> BodyConfig {
    BodyConfig {
        name: "quadcopter".to_string(),
        size: [3.0, 0.1, 3.0],
        mass: 30.0,
        position: [0.0, 0.0, 0.0],
        rotation: IDENTITY_ROTATION,
        material: MaterialConfig::solid(0x8fc49d),
        cast_shadow: true,
        receive_shadow: false,
    }
}

fn rotor(name: &str, offset: [f32; 3], direction: Direction, group: RotorGroup) -> RotorConfig {
    RotorConfig {
        name: name.to_string(),
        parent: "quadcopter".to_string(),
        offset,
        direction,
        group,
    }
}
