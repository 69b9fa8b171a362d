// copter-web: browser frontend, a canvas blit around the copter core
use copter::{ScenarioConfig, Simulation, TimestampClock, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Class added to <body> when the page cannot draw
pub const NO_CANVAS_CLASS: &str = "no-canvas";

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

/// Scenario by name, falling back to the quadcopter
pub fn scenario_or_default(name: Option<&str>) -> Result<ScenarioConfig, copter::CopterError> {
    match name {
        Some(name) => ScenarioConfig::preset(name),
        None => Ok(ScenarioConfig::quadcopter()),
    }
}

#[wasm_bindgen]
pub struct CopterWeb {
    sim: Simulation,
    clock: TimestampClock,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl CopterWeb {
    /// Attach to `<canvas id=canvas_id>` and build `scenario` (default: quadcopter)
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, scenario: Option<String>) -> Result<CopterWeb, JsValue> {
        console_error_panic_hook::set_once();
        // a second instance on the same page finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);

        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let document = window.document().ok_or_else(|| js_error("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_error(format!("no element #{canvas_id}")))?
            .dyn_into::<HtmlCanvasElement>()?;

        let ctx = match canvas.get_context("2d")? {
            Some(ctx) => ctx.dyn_into::<CanvasRenderingContext2d>()?,
            None => {
                if let Some(body) = document.body() {
                    body.class_list().add_1(NO_CANVAS_CLASS)?;
                }
                return Err(js_error("2d canvas unavailable"));
            }
        };

        // a hidden frame reports 0x0
        let viewport = Viewport {
            width: window.inner_width()?.as_f64().unwrap_or(640.0) as u32,
            height: window.inner_height()?.as_f64().unwrap_or(480.0) as u32,
        }
        .clamped();
        let Viewport { width, height } = viewport;
        canvas.set_width(width);
        canvas.set_height(height);

        let config = scenario_or_default(scenario.as_deref()).map_err(js_error)?;
        let sim = Simulation::new(config, viewport).map_err(js_error)?;
        log::info!("copter web ready: {width}x{height}");

        Ok(Self {
            sim,
            clock: TimestampClock::new(),
            canvas,
            ctx,
        })
    }

    /// keypress `keyCode`; returns true when the page should preventDefault
    #[wasm_bindgen]
    pub fn key_press(&mut self, code: u32) -> bool {
        self.sim.key_press(code)
    }

    /// Call from the window resize listener with innerWidth/innerHeight
    #[wasm_bindgen]
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.sim.resize(width, height) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }

    /// Call from requestAnimationFrame with its timestamp
    #[wasm_bindgen]
    pub fn frame(&mut self, timestamp: f64) -> Result<(), JsValue> {
        let dt = self.clock.advance(timestamp);
        self.sim.tick(dt);

        let buffer = self.sim.buffer();
        let bytes = buffer.as_rgba_bytes();
        let image = web_sys::ImageData::new_with_u8_clamped_array_and_sh(Clamped(bytes.as_slice()), buffer.width, buffer.height)?;
        self.ctx.put_image_data(&image, 0.0, 0.0)?;

        if let Some(pose) = self.sim.focus_pose() {
            let p = pose.position;
            let hud = format!("pos ({:.1}, {:.1}, {:.1})  power {:?}", p.x, p.y, p.z, self.power());
            self.ctx.set_fill_style_str("black");
            self.ctx.set_font("12px monospace");
            self.ctx.fill_text(&hud, 10.0, 20.0)?;
        }
        Ok(())
    }

    /// Current power of each rotor, in scenario order
    #[wasm_bindgen]
    pub fn power(&self) -> Vec<f32> {
        self.sim.rotors().iter().map(|r| r.power()).collect()
    }

    /// Pitch trim counter, -5..=5
    #[wasm_bindgen]
    pub fn forward(&self) -> i32 {
        self.sim.input().forward()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_defaults_to_quadcopter() {
        assert_eq!(scenario_or_default(None).unwrap().name, "quadcopter");
        assert_eq!(scenario_or_default(Some("ramp")).unwrap().name, "ramp");
        assert!(scenario_or_default(Some("zeppelin")).is_err());
    }
}
