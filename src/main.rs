//! softpipe: software triangle pipeline
//!
//! Renders a mesh with a CPU-side pipeline in the style of early 3D:
//! - Look-at camera with yaw and free movement
//! - Back-face culling and flat diffuse lighting
//! - Near-plane and viewport clipping
//! - Painter's algorithm instead of a depth buffer
//! - Affine texture mapping (warpy textures)

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod rasterizer;
mod world;
mod config;
mod input;
mod logging;

use std::path::PathBuf;
use macroquad::prelude::*;
use rasterizer::{Color as RasterColor, Framebuffer, Mesh, RendererState, Texture};
use config::{load_config, load_config_or_default, AppConfig, CONFIG_PATH};
use input::{apply_input, poll_input, Controls};
use logging::{init_logging, LoggingConfig};
use world::load_mesh;

/// Settings file from the first CLI argument, else the default location
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
}

fn window_conf() -> Conf {
    // Runs before the logger exists; main reports any problem with the file
    let config = load_config(config_path()).unwrap_or_default();
    Conf {
        window_title: format!("softpipe v{}", VERSION),
        window_width: config.window_width as i32,
        window_height: config.window_height as i32,
        window_resizable: true,
        ..Default::default()
    }
}

/// Texture for textured mode: the configured image, or a checkerboard
fn load_texture(config: &AppConfig) -> Texture {
    let fallback = || Texture::checkerboard(32, 32, RasterColor::WHITE, RasterColor::new(200, 40, 40));

    match &config.texture_path {
        Some(path) => match Texture::from_file(path) {
            Ok(tex) => {
                log::info!("Loaded texture: {} ({}x{})", tex.name, tex.width, tex.height);
                tex
            }
            Err(e) => {
                log::warn!("{}, using checkerboard", e);
                fallback()
            }
        },
        None => fallback(),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging(LoggingConfig::default());

    let config = load_config_or_default(config_path());

    let mesh = match &config.mesh_path {
        Some(path) => match load_mesh(path) {
            Ok(mesh) => {
                log::info!("Loaded {} with {} triangles", path.display(), mesh.len());
                mesh
            }
            Err(e) => {
                log::error!("Failed to load mesh {}: {}", path.display(), e);
                eprintln!("softpipe: cannot load mesh {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            log::info!("No mesh configured, rendering the built-in cube");
            Mesh::cube()
        }
    };
    if mesh.is_empty() {
        log::warn!("Mesh has no triangles, nothing will be drawn");
    }

    let texture = load_texture(&config);
    let mut controls = Controls::from(&config);
    let mut state = RendererState::new(config.pipeline.clone());
    let mut fb = Framebuffer::new(config.window_width as usize, config.window_height as usize);

    log::info!("=== softpipe v{} ===", VERSION);

    loop {
        let dt = get_frame_time();

        let frame_input = poll_input();
        if frame_input.quit {
            break;
        }
        apply_input(&mut state, &mut controls, &frame_input, dt);
        state.advance(dt);

        // Viewport may change between frames
        let screen_w = screen_width().max(0.0) as usize;
        let screen_h = screen_height().max(0.0) as usize;
        fb.resize(screen_w, screen_h);
        fb.clear(RasterColor::BLACK);

        state.render(&mesh, &mut fb, Some(&texture));

        clear_background(BLACK);
        if fb.width > 0 && fb.height > 0 {
            let frame = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
            frame.set_filter(FilterMode::Nearest);
            draw_texture_ex(
                &frame,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(screen_w as f32, screen_h as f32)),
                    ..Default::default()
                },
            );
        }

        draw_text(
            &format!(
                "{} fps | {} | {}/{} tris | cam ({:.1}, {:.1}, {:.1}) yaw {:.2} | bias {:.2}",
                get_fps(),
                state.draw_mode.label(),
                state.stats.drawn,
                state.stats.input,
                state.camera.position.x,
                state.camera.position.y,
                state.camera.position.z,
                state.camera.yaw,
                state.settings.distance_bias,
            ),
            10.0,
            20.0,
            20.0,
            YELLOW,
        );

        next_frame().await;
    }

    log::info!("Bye");
}
