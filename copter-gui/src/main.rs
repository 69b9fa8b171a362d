// copter-gui: desktop frontend around the copter core, presented through pixels
use anyhow::{Context, Result, anyhow, bail};
use copter::{
    Clock, FixedClock, InputEvent, PixelBuffer, Presenter, RunLimit, ScenarioConfig, Simulation, Viewport, WallClock,
};
use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use std::env;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const INITIAL_WIDTH: u32 = 960;
const INITIAL_HEIGHT: u32 = 640;
const HEADLESS_FRAMES: u64 = 600;
const REPORT_EVERY: u64 = 60;

const USAGE: &str = "usage: copter-gui [SCENARIO | --config FILE] [--headless] [--frames N]";

struct Options {
    scenario: ScenarioConfig,
    headless: bool,
    frames: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut scenario = None;
    let mut headless = false;
    let mut frames = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => headless = true,
            "--frames" => {
                let value = args.next().context("--frames needs a value")?;
                frames = Some(value.parse::<u64>().with_context(|| format!("invalid frame count {value}"))?);
            }
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                scenario = Some(ScenarioConfig::load(path)?);
            }
            "--help" | "-h" => bail!(USAGE),
            name if !name.starts_with('-') && scenario.is_none() => {
                scenario = Some(ScenarioConfig::preset(name).with_context(|| {
                    format!("known scenarios: {}", copter::PRESET_NAMES.join(", "))
                })?);
            }
            other => bail!("unexpected argument {other}\n{USAGE}"),
        }
    }

    Ok(Options {
        scenario: scenario.unwrap_or_else(ScenarioConfig::quadcopter),
        headless,
        frames,
    })
}

/// Character code of a single-character logical key, like a browser keypress
fn key_code(key: &Key) -> Option<u32> {
    match key {
        Key::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(u32::from(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

struct CopterApp {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    sim: Simulation,
    clock: WallClock,
    limit: RunLimit,
    failure: Option<anyhow::Error>,
}

impl CopterApp {
    fn new(sim: Simulation, limit: RunLimit) -> Self {
        Self {
            window: None,
            pixels: None,
            sim,
            clock: WallClock::new(),
            limit,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if !self.sim.resize(width, height) {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(width, height)?;
            pixels.resize_buffer(width, height)?;
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let report = self.sim.tick(self.clock.delta());

        let frame = self.sim.frame_count();
        if frame % REPORT_EVERY == 0 {
            if let Some(pose) = self.sim.focus_pose() {
                let p = pose.position;
                let power: Vec<f32> = self.sim.rotors().iter().map(|r| r.power()).collect();
                info!(
                    "Frame {frame}: focus=({:.2},{:.2},{:.2}) power={power:?} steps={}",
                    p.x, p.y, p.z, report.physics_steps
                );
            }
        }

        if let Some(pixels) = &mut self.pixels {
            let buffer = self.sim.buffer();
            let target = pixels.frame_mut();
            if target.len() == buffer.pixels.len() * 4 {
                for (dst, src) in target.chunks_exact_mut(4).zip(&buffer.pixels) {
                    dst.copy_from_slice(src);
                }
            } else {
                warn!("Skipping frame: surface and buffer sizes differ");
            }
            pixels.render().map_err(|e| anyhow!("render failed: {e}"))?;
        }
        Ok(())
    }
}

impl ApplicationHandler for CopterApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("copter")
            .with_inner_size(PhysicalSize::new(INITIAL_WIDTH, INITIAL_HEIGHT));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow!("cannot create window: {e}")),
        };

        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        // capability check: without a GPU surface there is nothing to draw on
        let pixels = match Pixels::new(size.width, size.height, surface) {
            Ok(pixels) => pixels,
            Err(e) => return self.fail(event_loop, anyhow!("no usable GPU surface: {e}")),
        };
        self.pixels = Some(pixels);
        if let Err(e) = self.resize(size.width, size.height) {
            return self.fail(event_loop, e);
        }

        info!("Window {}x{}; keys: w/s throttle, i/k pitch trim, Esc quits", size.width, size.height);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                } else if let Some(code) = key_code(&logical_key) {
                    self.sim.handle_event(InputEvent::KeyPress(code));
                }
            }

            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size.width, size.height) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    return self.fail(event_loop, e);
                }
                if self.limit.max_frames.is_some_and(|max| self.sim.frame_count() >= max) {
                    info!("Frame limit reached");
                    event_loop.exit();
                } else if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

/// Headless presenter: nothing to show, exits only through the frame limit
struct LogPresenter {
    frames: u64,
}

impl Presenter for LogPresenter {
    fn present(&mut self, buffer: &PixelBuffer) -> copter::Result<()> {
        self.frames += 1;
        if self.frames % REPORT_EVERY == 0 {
            log::debug!("Frame {} rendered at {}x{}", self.frames, buffer.width, buffer.height);
        }
        Ok(())
    }

    fn handle_input(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }

    fn should_exit(&self) -> bool {
        false
    }
}

fn run_headless(mut sim: Simulation, frames: u64) -> Result<()> {
    let mut clock = FixedClock(sim.config().physics.fixed_timestep);
    let stats = sim.run(&mut clock, &mut LogPresenter { frames: 0 }, RunLimit::frames(frames))?;
    if let Some(pose) = sim.focus_pose() {
        let p = pose.position;
        info!(
            "Focus after {:.2}s: ({:.3}, {:.3}, {:.3})",
            stats.elapsed, p.x, p.y, p.z
        );
    }
    for object in sim.scene().objects() {
        if let Some(v) = object.body.and_then(|b| sim.physics().linear_velocity(b)) {
            info!("{}: speed {:.3} m/s", object.name, v.norm());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;
    info!("Starting scenario {}", options.scenario.name);

    if options.headless {
        let viewport = Viewport { width: 320, height: 240 };
        let sim = Simulation::new(options.scenario, viewport)?;
        return run_headless(sim, options.frames.unwrap_or(HEADLESS_FRAMES));
    }

    let viewport = Viewport {
        width: INITIAL_WIDTH,
        height: INITIAL_HEIGHT,
    };
    let sim = Simulation::new(options.scenario, viewport)?;
    let limit = RunLimit {
        max_frames: options.frames,
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = CopterApp::new(sim, limit);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_quadcopter_window() {
        let options = parse_args(&[]).unwrap();
        assert_eq!(options.scenario.name, "quadcopter");
        assert!(!options.headless);
        assert_eq!(options.frames, None);
    }

    #[test]
    fn parses_preset_and_headless_frames() {
        let options = parse_args(&args(&["ramp", "--headless", "--frames", "30"])).unwrap();
        assert_eq!(options.scenario.name, "ramp");
        assert!(options.headless);
        assert_eq!(options.frames, Some(30));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["blimp"])).is_err());
        assert!(parse_args(&args(&["--frames", "many"])).is_err());
        assert!(parse_args(&args(&["--frames"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn single_characters_become_key_codes() {
        assert_eq!(key_code(&Key::Character("w".into())), Some(119));
        assert_eq!(key_code(&Key::Character("i".into())), Some(105));
        assert_eq!(key_code(&Key::Character("ab".into())), None);
    }

    #[test]
    fn headless_run_finishes() {
        let sim = Simulation::new(ScenarioConfig::ramp(), Viewport { width: 32, height: 24 }).unwrap();
        run_headless(sim, 10).unwrap();
    }
}
