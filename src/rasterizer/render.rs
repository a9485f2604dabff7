//! Triangle rasterization
//! Flat fill, affine-textured scanline fill and wireframe edges

use super::math::{Uv, Vec2};
use super::types::{Color, DrawMode, Texture, Triangle};

/// Drawing surface the rasterizer writes to
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Color, thickness: f32);
    fn draw_filled_triangle(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, color: Color);
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);
}

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height * 4];
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    #[cfg(test)]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let p = &self.pixels[idx..idx + 4];
            Some(Color::with_alpha(p[0], p[1], p[2], p[3]))
        } else {
            None
        }
    }

    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = (y as usize * self.width + x as usize) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        loop {
            self.put(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw a thick line by drawing multiple parallel lines
    pub fn draw_thick_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: Color) {
        if thickness <= 1 {
            self.draw_line(x0, y0, x1, y1, color);
            return;
        }

        // Calculate perpendicular offset
        let dx = (x1 - x0) as f32;
        let dy = (y1 - y0) as f32;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 0.001 {
            return;
        }

        let px = -dy / len;
        let py = dx / len;

        let half_thickness = thickness / 2;
        for i in -half_thickness..=half_thickness {
            let offset = i as f32;
            let ox0 = (x0 as f32 + px * offset) as i32;
            let oy0 = (y0 as f32 + py * offset) as i32;
            let ox1 = (x1 as f32 + px * offset) as i32;
            let oy1 = (y1 as f32 + py * offset) as i32;
            self.draw_line(ox0, oy0, ox1, oy1, color);
        }
    }

    /// Bounding-box fill using barycentric coverage. Works for either winding.
    pub fn fill_triangle(&mut self, v1: Vec2, v2: Vec2, v3: Vec2, color: Color) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let min_x = v1.x.min(v2.x).min(v3.x).max(0.0) as usize;
        let max_x = (v1.x.max(v2.x).max(v3.x) + 1.0).min(self.width as f32) as usize;
        let min_y = v1.y.min(v2.y).min(v3.y).max(0.0) as usize;
        let max_y = (v1.y.max(v2.y).max(v3.y) + 1.0).min(self.height as f32) as usize;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec2::new(x as f32, y as f32);
                let Some((a, b, c)) = barycentric(p, v1, v2, v3) else {
                    return;
                };

                const ERR: f32 = -0.0001;
                if a >= ERR && b >= ERR && c >= ERR {
                    self.put(x as i32, y as i32, color);
                }
            }
        }
    }
}

impl Canvas for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Color, thickness: f32) {
        self.draw_thick_line(
            p1.x as i32,
            p1.y as i32,
            p2.x as i32,
            p2.y as i32,
            thickness.round() as i32,
            color,
        );
    }

    fn draw_filled_triangle(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, color: Color) {
        self.fill_triangle(p1, p2, p3, color);
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.put(x, y, color);
    }
}

/// Barycentric weights of `p` in triangle (v1, v2, v3); `None` if degenerate
pub fn barycentric(p: Vec2, v1: Vec2, v2: Vec2, v3: Vec2) -> Option<(f32, f32, f32)> {
    let d = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);

    if d.abs() < 0.0001 {
        return None;
    }

    let u = ((v2.y - v3.y) * (p.x - v3.x) + (v3.x - v2.x) * (p.y - v3.y)) / d;
    let v = ((v3.y - v1.y) * (p.x - v3.x) + (v1.x - v3.x) * (p.y - v3.y)) / d;
    let w = 1.0 - u - v;

    Some((u, v, w))
}

/// Draw one screen-space triangle according to `mode`.
///
/// The fill goes down first so edges stay visible in `Both`. A present
/// `texture` switches the fill from flat color to the affine scanline fill.
pub fn draw_triangle<C: Canvas>(
    canvas: &mut C,
    tri: &Triangle,
    mode: DrawMode,
    texture: Option<&Texture>,
    thickness: f32,
) {
    let p1 = Vec2::from(tri.p[0]);
    let p2 = Vec2::from(tri.p[1]);
    let p3 = Vec2::from(tri.p[2]);

    if mode.draws_fill() {
        match texture {
            Some(tex) => textured_triangle(canvas, tri, tex),
            None => {
                let color = tri.color();
                // Primitive fills may cull by winding; submit both orders
                canvas.draw_filled_triangle(p1, p2, p3, color);
                canvas.draw_filled_triangle(p3, p2, p1, color);
            }
        }
    }

    if mode.draws_edges() {
        let color = mode.edge_color();
        canvas.draw_line(p1, p2, color, thickness);
        canvas.draw_line(p2, p3, color, thickness);
        canvas.draw_line(p3, p1, color, thickness);
    }
}

/// Screen vertex for the scanline walk
#[derive(Debug, Clone, Copy)]
struct ScanVertex {
    x: i32,
    y: i32,
    uv: Uv,
}

/// Per-scanline increments along one edge
#[derive(Debug, Clone, Copy, Default)]
struct EdgeStep {
    x: f32,
    uv: Uv,
}

impl EdgeStep {
    fn between(a: ScanVertex, b: ScanVertex) -> Self {
        let dy = b.y - a.y;
        if dy == 0 {
            return Self { x: 0.0, uv: Uv { u: 0.0, v: 0.0, w: 0.0 } };
        }
        let inv = 1.0 / dy.abs() as f32;
        Self {
            x: (b.x - a.x) as f32 * inv,
            uv: Uv {
                u: (b.uv.u - a.uv.u) * inv,
                v: (b.uv.v - a.uv.v) * inv,
                w: (b.uv.w - a.uv.w) * inv,
            },
        }
    }

    /// Position and UV `rows` scanlines below `from`
    fn at(&self, from: ScanVertex, rows: i32) -> (f32, Uv) {
        let k = rows as f32;
        (
            from.x as f32 + k * self.x,
            Uv {
                u: from.uv.u + k * self.uv.u,
                v: from.uv.v + k * self.uv.v,
                w: from.uv.w + k * self.uv.w,
            },
        )
    }
}

/// Affine texture fill: walk both halves of the triangle row by row and
/// interpolate UV linearly across each span.
pub fn textured_triangle<C: Canvas>(canvas: &mut C, tri: &Triangle, texture: &Texture) {
    let mut v: [ScanVertex; 3] = [0, 1, 2].map(|i| ScanVertex {
        x: tri.p[i].x as i32,
        y: tri.p[i].y as i32,
        uv: tri.uv[i],
    });
    v.sort_by_key(|sv| sv.y);
    let [v1, v2, v3] = v;

    // v1 -> v3 is the long edge, shared by both halves
    let long = EdgeStep::between(v1, v3);

    if v2.y != v1.y {
        let short = EdgeStep::between(v1, v2);
        for y in v1.y..=v2.y {
            let a = short.at(v1, y - v1.y);
            let b = long.at(v1, y - v1.y);
            fill_span(canvas, texture, y, a, b);
        }
    }

    if v3.y != v2.y {
        let short = EdgeStep::between(v2, v3);
        for y in v2.y..=v3.y {
            let a = short.at(v2, y - v2.y);
            let b = long.at(v1, y - v1.y);
            fill_span(canvas, texture, y, a, b);
        }
    }
}

/// One textured scanline between two edge crossings
fn fill_span<C: Canvas>(canvas: &mut C, texture: &Texture, y: i32, a: (f32, Uv), b: (f32, Uv)) {
    let (mut start, mut end) = (a, b);
    if start.0 > end.0 {
        std::mem::swap(&mut start, &mut end);
    }

    let ax = start.0 as i32;
    let bx = end.0 as i32;
    if bx == ax {
        return;
    }

    let t_step = 1.0 / (bx - ax) as f32;
    let mut t = 0.0;
    for x in ax..bx {
        let uv = start.1.lerp(end.1, t);
        canvas.set_pixel(x, y, texture.sample(uv.u, uv.v));
        t += t_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Vec4;

    /// Records draw calls instead of touching pixels
    #[derive(Default)]
    struct RecordingCanvas {
        lines: Vec<(Vec2, Vec2, Color)>,
        fills: Vec<(Vec2, Vec2, Vec2, Color)>,
        pixels: Vec<(i32, i32, Color)>,
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> usize {
            320
        }
        fn height(&self) -> usize {
            240
        }
        fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Color, _thickness: f32) {
            self.lines.push((p1, p2, color));
        }
        fn draw_filled_triangle(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, color: Color) {
            self.fills.push((p1, p2, p3, color));
        }
        fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
            self.pixels.push((x, y, color));
        }
    }

    fn screen_tri() -> Triangle {
        let mut t = Triangle::new(
            Vec4::new(10.0, 10.0, 0.5),
            Vec4::new(40.0, 10.0, 0.5),
            Vec4::new(10.0, 40.0, 0.5),
        );
        t.uv = [Uv::new(0.0, 0.0), Uv::new(1.0, 0.0), Uv::new(0.0, 1.0)];
        t.light = 0.5;
        t
    }

    #[test]
    fn test_wireframe_draws_three_white_edges() {
        let mut canvas = RecordingCanvas::default();
        draw_triangle(&mut canvas, &screen_tri(), DrawMode::Wireframe, None, 1.0);
        assert_eq!(canvas.lines.len(), 3);
        assert!(canvas.fills.is_empty());
        assert!(canvas.lines.iter().all(|l| l.2 == Color::WHITE));
    }

    #[test]
    fn test_model_fills_both_windings() {
        let mut canvas = RecordingCanvas::default();
        let tri = screen_tri();
        draw_triangle(&mut canvas, &tri, DrawMode::Model, None, 1.0);
        assert_eq!(canvas.fills.len(), 2);
        assert!(canvas.lines.is_empty());
        assert_eq!(canvas.fills[0].0, canvas.fills[1].2);
        assert_eq!(canvas.fills[0].3, tri.color());
    }

    #[test]
    fn test_both_draws_black_edges_over_fill() {
        let mut canvas = RecordingCanvas::default();
        draw_triangle(&mut canvas, &screen_tri(), DrawMode::Both, None, 1.0);
        assert_eq!(canvas.fills.len(), 2);
        assert_eq!(canvas.lines.len(), 3);
        assert!(canvas.lines.iter().all(|l| l.2 == Color::BLACK));
    }

    #[test]
    fn test_textured_fill_uses_set_pixel() {
        let mut canvas = RecordingCanvas::default();
        let tex = Texture::checkerboard(8, 8, Color::WHITE, Color::BLACK);
        draw_triangle(&mut canvas, &screen_tri(), DrawMode::Model, Some(&tex), 1.0);
        assert!(canvas.fills.is_empty());
        assert!(!canvas.pixels.is_empty());
        for (x, y, _) in &canvas.pixels {
            assert!(*x >= 10 && *x <= 40);
            assert!(*y >= 10 && *y <= 40);
        }
    }

    /// White 8x8 texture with texel 8 marked. UV (0.55, 0.3) lands on it:
    /// (int)(0.55 * 8) * (int)(0.3 * 8) = 4 * 2.
    fn marked_texture() -> Texture {
        let mut tex = Texture::checkerboard(8, 8, Color::WHITE, Color::WHITE);
        tex.pixels[8] = Color::MAGENTA;
        tex
    }

    #[test]
    fn test_textured_constant_uv_samples_one_texel() {
        let mut canvas = RecordingCanvas::default();
        let mut tri = screen_tri();
        tri.uv = [Uv::new(0.55, 0.3); 3];
        textured_triangle(&mut canvas, &tri, &marked_texture());

        assert!(!canvas.pixels.is_empty());
        assert!(canvas.pixels.iter().all(|p| p.2 == Color::MAGENTA));
    }

    #[test]
    fn test_textured_span_starts_at_long_edge() {
        let mut canvas = RecordingCanvas::default();
        // Long edge runs down x = 10; the short edges bulge out to x = 40
        let mut tri = Triangle::new(
            Vec4::new(10.0, 10.0, 0.5),
            Vec4::new(40.0, 20.0, 0.5),
            Vec4::new(10.0, 30.0, 0.5),
        );
        tri.uv = [Uv::new(0.55, 0.3), Uv::new(0.0, 0.0), Uv::new(0.55, 0.3)];
        textured_triangle(&mut canvas, &tri, &marked_texture());

        for y in 11..30 {
            let row: Vec<_> = canvas.pixels.iter().filter(|p| p.1 == y).collect();
            assert!(!row.is_empty(), "row {} empty", y);
            let left = row.iter().min_by_key(|p| p.0).unwrap();
            assert_eq!(left.0, 10);
            assert_eq!(left.2, Color::MAGENTA);
        }

        // Across the widest row UV fades toward (0, 0), which reads texel 0
        let right = canvas
            .pixels
            .iter()
            .filter(|p| p.1 == 20)
            .max_by_key(|p| p.0)
            .unwrap();
        assert_eq!(right.0, 39);
        assert_eq!(right.2, Color::WHITE);
    }

    #[test]
    fn test_textured_flat_triangle_draws_nothing() {
        let mut canvas = RecordingCanvas::default();
        let tex = Texture::checkerboard(8, 8, Color::WHITE, Color::BLACK);
        let tri = Triangle::new(
            Vec4::new(10.0, 20.0, 0.5),
            Vec4::new(40.0, 20.0, 0.5),
            Vec4::new(70.0, 20.0, 0.5),
        );
        textured_triangle(&mut canvas, &tri, &tex);
        assert!(canvas.pixels.is_empty());
    }

    #[test]
    fn test_framebuffer_fill_either_winding() {
        let mut fb = Framebuffer::new(64, 64);
        let (a, b, c) = (Vec2::new(4.0, 4.0), Vec2::new(40.0, 4.0), Vec2::new(4.0, 40.0));
        fb.fill_triangle(a, b, c, Color::WHITE);
        assert_eq!(fb.get_pixel(10, 10), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(50, 50), Some(Color::with_alpha(0, 0, 0, 0)));

        let mut fb2 = Framebuffer::new(64, 64);
        fb2.fill_triangle(c, b, a, Color::WHITE);
        assert_eq!(fb.pixels, fb2.pixels);
    }

    #[test]
    fn test_framebuffer_degenerate_fill_is_skipped() {
        let mut fb = Framebuffer::new(16, 16);
        let p = Vec2::new(3.0, 3.0);
        fb.fill_triangle(p, p, Vec2::new(8.0, 8.0), Color::WHITE);
        assert!(fb.pixels.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_framebuffer_line_clips_to_bounds() {
        let mut fb = Framebuffer::new(8, 8);
        fb.draw_line(-5, 3, 20, 3, Color::WHITE);
        for x in 0..8 {
            assert_eq!(fb.get_pixel(x, 3), Some(Color::WHITE));
        }
    }

    #[test]
    fn test_zero_size_framebuffer_is_noop() {
        let mut fb = Framebuffer::new(0, 0);
        draw_triangle(&mut fb, &screen_tri(), DrawMode::Both, None, 2.0);
        assert!(fb.pixels.is_empty());
    }
}
