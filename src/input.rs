//! Keyboard handling
//!
//! Polls macroquad key state into a `FrameInput`, then applies it to the
//! renderer. Only `poll_input` touches the window; the rest is plain data.

use macroquad::prelude::*;
use crate::config::AppConfig;
use crate::rasterizer::{CameraInput, RendererState};

/// Slowest the camera may move, in units per second
const MIN_MOVE_SPEED: f32 = 0.5;

/// Everything requested by the keyboard this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub camera: CameraInput,
    pub cycle_mode: bool,
    pub reset_camera: bool,
    pub toggle_texture: bool,
    /// +1 faster, -1 slower
    pub speed_change: i32,
    /// Held direction for the distance bias, in [-1, 1]
    pub bias_change: f32,
    pub quit: bool,
}

/// Movement tunables that change at runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    pub move_speed: f32,
    pub yaw_speed: f32,
    pub speed_step: f32,
    pub bias_step: f32,
}

impl From<&AppConfig> for Controls {
    fn from(config: &AppConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            yaw_speed: config.yaw_speed,
            speed_step: config.speed_step,
            bias_step: config.bias_step,
        }
    }
}

fn axis(positive: KeyCode, negative: KeyCode) -> f32 {
    let mut v = 0.0;
    if is_key_down(positive) {
        v += 1.0;
    }
    if is_key_down(negative) {
        v -= 1.0;
    }
    v
}

/// Sample the keyboard
pub fn poll_input() -> FrameInput {
    let mut speed_change = 0;
    if is_key_pressed(KeyCode::Equal) || is_key_pressed(KeyCode::KpAdd) {
        speed_change += 1;
    }
    if is_key_pressed(KeyCode::Minus) || is_key_pressed(KeyCode::KpSubtract) {
        speed_change -= 1;
    }

    FrameInput {
        camera: CameraInput {
            forward: axis(KeyCode::W, KeyCode::S),
            strafe: axis(KeyCode::D, KeyCode::A),
            rise: axis(KeyCode::E, KeyCode::Q),
            turn: axis(KeyCode::Left, KeyCode::Right),
        },
        cycle_mode: is_key_released(KeyCode::Tab) || is_key_released(KeyCode::Up),
        reset_camera: is_key_pressed(KeyCode::R),
        toggle_texture: is_key_pressed(KeyCode::T),
        speed_change,
        bias_change: axis(KeyCode::X, KeyCode::Z),
        quit: is_key_pressed(KeyCode::Escape),
    }
}

/// Apply one frame of input to the renderer
pub fn apply_input(state: &mut RendererState, controls: &mut Controls, input: &FrameInput, dt: f32) {
    if input.reset_camera {
        state.camera.reset();
        log::info!("Camera reset");
    }

    if input.cycle_mode {
        state.draw_mode = state.draw_mode.next();
        log::info!("Draw mode: {}", state.draw_mode.label());
    }

    if input.toggle_texture {
        state.settings.textured = !state.settings.textured;
        log::info!("Texturing {}", if state.settings.textured { "on" } else { "off" });
    }

    if input.speed_change != 0 {
        controls.move_speed = (controls.move_speed + input.speed_change as f32 * controls.speed_step)
            .max(MIN_MOVE_SPEED);
        log::debug!("Move speed: {:.1}", controls.move_speed);
    }

    state.settings.distance_bias += input.bias_change * controls.bias_step * dt;

    state.camera.apply(&input.camera, controls.move_speed, controls.yaw_speed, dt);
}
