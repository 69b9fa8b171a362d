// Copter - rigid-body quadcopter sandbox core
// Scene, physics and control live here; frontends only present pixels and forward input

pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod input;
pub mod physics;
pub mod pixel_buffer;
pub mod renderer;
pub mod rotor;
pub mod scene;
pub mod simulation;
pub mod world;

pub use camera::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use input::*;
pub use physics::*;
pub use pixel_buffer::*;
pub use renderer::*;
pub use rotor::*;
pub use scene::*;
pub use simulation::*;
pub use world::*;

/// Trait for frontends that put a finished frame on screen (window, canvas, nothing)
pub trait Presenter {
    fn present(&mut self, buffer: &PixelBuffer) -> Result<()>;
    fn handle_input(&mut self) -> Vec<InputEvent>;
    fn should_exit(&self) -> bool;
}

/// Input events forwarded from a frontend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Raw character code of a keypress (105 = 'i', 107 = 'k', ...)
    KeyPress(u32),
    Resize { width: u32, height: u32 },
    Exit,
}
