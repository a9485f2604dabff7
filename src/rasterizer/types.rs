//! Core types for the pipeline

use serde::{Deserialize, Serialize};
use super::math::{Mat4, Uv, Vec4};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const MAGENTA: Color = Color { r: 255, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn grey(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Flat display color for a lighting coefficient.
///
/// Rounds half to even, caps at 255, and mirrors negative values to positive
/// instead of clamping them to zero.
pub fn color_from_light(light: f32) -> Color {
    let mut c = (255.0 * light).round_ties_even();
    if c > 255.0 {
        c = 255.0;
    }
    if c < 0.0 {
        c = -c;
    }
    // Mirroring can overshoot again for light < -1
    Color::grey(c.min(255.0) as u8)
}

/// A triangle flowing through the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub p: [Vec4; 3],
    pub uv: [Uv; 3],
    /// Diffuse lighting coefficient, normally in [0, 1]
    pub light: f32,
}

impl Default for Triangle {
    fn default() -> Self {
        Self {
            p: [Vec4::ZERO; 3],
            uv: [Uv::default(); 3],
            light: 0.0,
        }
    }
}

impl Triangle {
    #[cfg(test)]
    pub fn new(p0: Vec4, p1: Vec4, p2: Vec4) -> Self {
        Self {
            p: [p0, p1, p2],
            ..Default::default()
        }
    }

    pub fn with_uv(p: [Vec4; 3], uv: [Uv; 3]) -> Self {
        Self { p, uv, light: 0.0 }
    }

    /// Derived from `light` every time, never stored
    pub fn color(&self) -> Color {
        color_from_light(self.light)
    }

    /// Positions multiplied by `m`; UVs and lighting carried over
    pub fn transformed(&self, m: &Mat4) -> Triangle {
        Triangle {
            p: [m.transform(self.p[0]), m.transform(self.p[1]), m.transform(self.p[2])],
            ..*self
        }
    }

    pub fn avg_z(&self) -> f32 {
        (self.p[0].z + self.p[1].z + self.p[2].z) / 3.0
    }

    pub fn is_finite(&self) -> bool {
        self.p.iter().all(|p| p.is_finite())
    }
}

/// Triangle soup in object space. Order has no meaning for rendering.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub tris: Vec<Triangle>,
}

impl Mesh {
    pub fn new(tris: Vec<Triangle>) -> Self {
        Self { tris }
    }

    pub fn len(&self) -> usize {
        self.tris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// Unit cube centered on the origin, two triangles per face, with UVs
    pub fn cube() -> Self {
        let p = |x: f32, y: f32, z: f32| Vec4::new(x - 0.5, y - 0.5, z - 0.5);
        let quad = |a: Vec4, b: Vec4, c: Vec4, d: Vec4| {
            [
                Triangle::with_uv([a, b, c], [Uv::new(0.0, 1.0), Uv::new(0.0, 0.0), Uv::new(1.0, 0.0)]),
                Triangle::with_uv([a, c, d], [Uv::new(0.0, 1.0), Uv::new(1.0, 0.0), Uv::new(1.0, 1.0)]),
            ]
        };

        let faces = [
            // South
            quad(p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)),
            // East
            quad(p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 1.0), p(1.0, 0.0, 1.0)),
            // North
            quad(p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0), p(0.0, 0.0, 1.0)),
            // West
            quad(p(0.0, 0.0, 1.0), p(0.0, 1.0, 1.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 0.0)),
            // Top
            quad(p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, 0.0)),
            // Bottom
            quad(p(1.0, 0.0, 1.0), p(0.0, 0.0, 1.0), p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)),
        ];

        Self {
            tris: faces.iter().flatten().copied().collect(),
        }
    }
}

/// What the rasterizer draws for each triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMode {
    Wireframe,
    #[default]
    Model,
    Both,
}

impl DrawMode {
    pub fn next(self) -> DrawMode {
        match self {
            DrawMode::Wireframe => DrawMode::Model,
            DrawMode::Model => DrawMode::Both,
            DrawMode::Both => DrawMode::Wireframe,
        }
    }

    pub fn draws_edges(self) -> bool {
        matches!(self, DrawMode::Wireframe | DrawMode::Both)
    }

    pub fn draws_fill(self) -> bool {
        matches!(self, DrawMode::Model | DrawMode::Both)
    }

    /// Edges are white on their own and black over filled triangles
    pub fn edge_color(self) -> Color {
        match self {
            DrawMode::Both => Color::BLACK,
            _ => Color::WHITE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawMode::Wireframe => "Wireframe",
            DrawMode::Model => "Model",
            DrawMode::Both => "Both",
        }
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    /// Load texture from an image file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Affine sample used by the scanline fill.
    ///
    /// The lookup multiplies the scaled u and v into a single flat index
    /// (`offset` is the texture width). Anything outside the array reads
    /// entry 0, including products too large for an index.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.pixels.is_empty() {
            return Color::MAGENTA;
        }
        let offset = self.width as f32;
        match ((u * offset) as i64).checked_mul((v * offset) as i64) {
            Some(idx) if idx >= 0 && (idx as usize) < self.pixels.len() => self.pixels[idx as usize],
            _ => self.pixels[0],
        }
    }
}
