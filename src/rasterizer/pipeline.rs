//! Per-frame geometry pipeline
//!
//! world transform -> cull/shade -> view transform -> near clip ->
//! project -> depth sort -> screen clip. The result is a list of
//! screen-space triangles ready for `render::draw_triangle`.

use serde::{Deserialize, Serialize};
use super::clip::{clip_to_screen, clip_triangle, screen_planes, Clipped, Plane};
use super::math::{Mat4, Vec4};
use super::render::{draw_triangle, Canvas};
use super::types::{DrawMode, Mesh, Texture, Triangle};

/// Tunables for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    /// Near distance used by the projection matrix
    pub near: f32,
    pub far: f32,
    /// View-space z of the clipping plane
    pub near_clip: f32,
    /// Added to w before the perspective divide
    pub distance_bias: f32,
    pub light_dir: Vec4,
    /// Lowest lighting coefficient a visible face can get
    pub light_floor: f32,
    pub world_rotation_z: f32,
    pub world_rotation_x: f32,
    /// How far in front of the origin the mesh sits
    pub world_offset_z: f32,
    /// Radians per second added to the world rotation (0 = static)
    pub spin_rate: f32,
    pub draw_mode: DrawMode,
    pub textured: bool,
    pub wireframe_thickness: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fov_deg: 90.0,
            near: 0.1,
            far: 1000.0,
            near_clip: 0.1,
            distance_bias: 0.0,
            light_dir: Vec4::with_w(0.0, 0.0, -1.0, 0.0),
            light_floor: 0.1,
            world_rotation_z: std::f32::consts::PI,
            world_rotation_x: 0.0,
            world_offset_z: 16.0,
            spin_rate: 0.0,
            draw_mode: DrawMode::Model,
            textured: false,
            wireframe_thickness: 1.0,
        }
    }
}

/// Movement requested for one frame. Each axis is in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: f32,
    pub strafe: f32,
    pub rise: f32,
    pub turn: f32,
}

/// Free-fly camera: position plus yaw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec4,
    pub yaw: f32,
    /// Derived from `yaw` by `update_look`
    pub look_dir: Vec4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec4::ZERO, 0.0)
    }
}

impl Camera {
    pub fn new(position: Vec4, yaw: f32) -> Self {
        let mut cam = Self {
            position,
            yaw,
            look_dir: Vec4::FORWARD,
        };
        cam.update_look();
        cam
    }

    pub fn update_look(&mut self) {
        let dir = Mat4::rotation_y(self.yaw).transform(Vec4::with_w(0.0, 0.0, 1.0, 0.0));
        self.look_dir = dir.normalize();
    }

    /// Horizontal right-hand direction
    pub fn right(&self) -> Vec4 {
        Vec4::UP.cross(self.look_dir).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.look_dir;
        Mat4::point_at(self.position, target, Vec4::UP).quick_inverse()
    }

    /// Apply one frame of movement. `speed` is units per second, `turn_speed`
    /// radians per second.
    pub fn apply(&mut self, input: &CameraInput, speed: f32, turn_speed: f32, dt: f32) {
        self.yaw += input.turn * turn_speed * dt;
        self.update_look();

        let step = speed * dt;
        let mut pos = self.position;
        pos = pos + self.look_dir * (input.forward * step);
        pos = pos + self.right() * (input.strafe * step);
        // Screen y grows downwards, so rising means decreasing world y
        pos.y -= input.rise * step;
        pos.w = 1.0;
        self.position = pos;
    }

    pub fn reset(&mut self) {
        *self = Camera::default();
    }
}

/// Counters for the last processed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub input: usize,
    pub visible: usize,
    pub projected: usize,
    pub drawn: usize,
}

/// Back-face cull and flat shading on a world-space triangle.
///
/// Returns the triangle with its lighting filled in, or `None` if it faces
/// away from the camera or has no usable normal.
pub fn shade(tri: &Triangle, camera_pos: Vec4, light_dir: Vec4, light_floor: f32) -> Option<Triangle> {
    let line1 = tri.p[1] - tri.p[0];
    let line2 = tri.p[2] - tri.p[0];
    let normal = line1.cross(line2).normalize();
    if normal.len() == 0.0 {
        return None;
    }

    let camera_ray = tri.p[0] - camera_pos;
    if normal.dot(camera_ray) >= 0.0 {
        return None;
    }

    let light = normal.dot(light_dir.normalize()).max(light_floor);
    Some(Triangle { light, ..*tri })
}

/// Perspective-project a view-space triangle into pixel space.
///
/// Positions are divided by `w + bias`, shifted from [-1, 1] to [0, 2] and
/// scaled to the viewport. Returns `None` when the divisor vanishes or the
/// result is not finite.
pub fn project(tri: &Triangle, projection: &Mat4, bias: f32, width: f32, height: f32) -> Option<Triangle> {
    let mut out = tri.transformed(projection);

    for p in out.p.iter_mut() {
        let d = p.w + bias;
        if d.abs() < f32::EPSILON {
            return None;
        }
        *p = Vec4::new(
            (p.x / d + 1.0) * 0.5 * width,
            (p.y / d + 1.0) * 0.5 * height,
            p.z / d,
        );
    }

    if out.is_finite() {
        Some(out)
    } else {
        None
    }
}

/// Painter's order: larger average z first. Stable, so equal depths keep
/// their incoming order.
pub fn depth_sort(tris: &mut [Triangle]) {
    tris.sort_by(|a, b| b.avg_z().total_cmp(&a.avg_z()));
}

/// Everything the frame driver owns between frames
pub struct RendererState {
    pub settings: PipelineSettings,
    pub camera: Camera,
    /// Seconds since start, drives `spin_rate`
    pub elapsed: f32,
    pub draw_mode: DrawMode,
    pub stats: FrameStats,
    projection: Mat4,
    viewport: (usize, usize),
    projected: Vec<Triangle>,
    visible: Vec<Triangle>,
    queue: Vec<Triangle>,
    scratch: Vec<Triangle>,
}

impl RendererState {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            draw_mode: settings.draw_mode,
            settings,
            camera: Camera::default(),
            elapsed: 0.0,
            stats: FrameStats::default(),
            projection: Mat4::IDENTITY,
            viewport: (0, 0),
            projected: Vec::new(),
            visible: Vec::new(),
            queue: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn world_matrix(&self) -> Mat4 {
        let theta = self.settings.spin_rate * self.elapsed;
        Mat4::identity()
            * Mat4::rotation_z(self.settings.world_rotation_z + theta)
            * Mat4::rotation_x(self.settings.world_rotation_x + theta * 0.5)
            * Mat4::translation(0.0, 0.0, self.settings.world_offset_z)
    }

    /// Rebuild the projection when the viewport changes size
    fn update_projection(&mut self, width: usize, height: usize) {
        if self.viewport == (width, height) {
            return;
        }
        self.viewport = (width, height);
        let aspect = height as f32 / width as f32;
        let s = &self.settings;
        self.projection = Mat4::projection(s.fov_deg, aspect, s.near, s.far);
        log::debug!("viewport {}x{}, projection rebuilt", width, height);
    }

    /// Run every geometry stage for one frame and return the screen-space
    /// triangles in draw order.
    pub fn process(&mut self, mesh: &Mesh, width: usize, height: usize) -> &[Triangle] {
        self.visible.clear();
        self.stats = FrameStats {
            input: mesh.len(),
            ..FrameStats::default()
        };
        if width == 0 || height == 0 {
            return &self.visible;
        }
        self.update_projection(width, height);

        let world = self.world_matrix();
        let view = self.camera.view_matrix();
        let near = Plane::near(self.settings.near_clip);
        let (w, h) = (width as f32, height as f32);

        self.projected.clear();
        for tri in &mesh.tris {
            let world_tri = tri.transformed(&world);
            let Some(lit) = shade(
                &world_tri,
                self.camera.position,
                self.settings.light_dir,
                self.settings.light_floor,
            ) else {
                continue;
            };
            self.stats.visible += 1;

            let viewed = lit.transformed(&view);
            let clipped = clip_triangle(&near, &viewed);
            let parts = match clipped {
                Clipped::None => [None, None],
                Clipped::One(a) => [Some(a), None],
                Clipped::Two(a, b) => [Some(a), Some(b)],
            };
            for part in parts.into_iter().flatten() {
                if let Some(p) = project(&part, &self.projection, self.settings.distance_bias, w, h) {
                    self.projected.push(p);
                }
            }
        }
        self.stats.projected = self.projected.len();

        depth_sort(&mut self.projected);

        let planes = screen_planes(width, height);
        for tri in &self.projected {
            clip_to_screen(tri, &planes, &mut self.queue, &mut self.scratch, &mut self.visible);
        }
        self.stats.drawn = self.visible.len();

        log::trace!(
            "frame: {} in, {} visible, {} projected, {} drawn",
            self.stats.input,
            self.stats.visible,
            self.stats.projected,
            self.stats.drawn
        );

        &self.visible
    }

    /// Process a frame and rasterize it onto `canvas`
    pub fn render<C: Canvas>(&mut self, mesh: &Mesh, canvas: &mut C, texture: Option<&Texture>) {
        let (width, height) = (canvas.width(), canvas.height());
        let mode = self.draw_mode;
        let thickness = self.settings.wireframe_thickness;
        let texture = if self.settings.textured { texture } else { None };

        self.process(mesh, width, height);
        for tri in &self.visible {
            draw_triangle(canvas, tri, mode, texture, thickness);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Uv;
    use crate::rasterizer::{Color, Framebuffer};
    use crate::world::load_mesh_from_str;

    const EPS: f32 = 0.001;

    /// Identity world transform so tests can place geometry in view space
    fn flat_settings() -> PipelineSettings {
        PipelineSettings {
            world_rotation_z: 0.0,
            world_offset_z: 0.0,
            ..PipelineSettings::default()
        }
    }

    fn facing_camera_at_z5() -> Triangle {
        // Wound so the normal points back at the origin
        Triangle::new(
            Vec4::new(0.0, 0.0, 5.0),
            Vec4::new(0.0, 1.0, 5.0),
            Vec4::new(1.0, 0.0, 5.0),
        )
    }

    #[test]
    fn test_camera_yaw_turns_look_dir() {
        let mut cam = Camera::default();
        assert!((cam.look_dir.z - 1.0).abs() < EPS);
        cam.yaw = std::f32::consts::FRAC_PI_2;
        cam.update_look();
        assert!((cam.look_dir.x + 1.0).abs() < EPS);
        assert!(cam.look_dir.z.abs() < EPS);
    }

    #[test]
    fn test_camera_moves_along_look() {
        let mut cam = Camera::default();
        let input = CameraInput { forward: 1.0, ..Default::default() };
        cam.apply(&input, 8.0, 2.0, 0.5);
        assert!((cam.position.z - 4.0).abs() < EPS);
        assert_eq!(cam.position.w, 1.0);
        cam.reset();
        assert_eq!(cam, Camera::default());
    }

    #[test]
    fn test_shade_keeps_front_face() {
        let tri = facing_camera_at_z5();
        let lit = shade(&tri, Vec4::ZERO, Vec4::with_w(0.0, 0.0, -1.0, 0.0), 0.1).expect("front face");
        assert!((lit.light - 1.0).abs() < EPS);
        assert_eq!(lit.p, tri.p);
    }

    #[test]
    fn test_shade_culls_back_face() {
        let tri = Triangle::new(
            Vec4::new(0.0, 0.0, 5.0),
            Vec4::new(1.0, 0.0, 5.0),
            Vec4::new(0.0, 1.0, 5.0),
        );
        assert!(shade(&tri, Vec4::ZERO, Vec4::with_w(0.0, 0.0, -1.0, 0.0), 0.1).is_none());
    }

    #[test]
    fn test_shade_applies_light_floor() {
        // Faces the camera (which sits above it) but is edge-on to the light
        let tri = Triangle::new(
            Vec4::new(0.0, 0.0, 5.0),
            Vec4::new(0.0, 0.0, 6.0),
            Vec4::new(1.0, 0.0, 5.0),
        );
        let cam = Vec4::new(0.0, 10.0, 0.0);
        let lit = shade(&tri, cam, Vec4::with_w(0.0, 0.0, -1.0, 0.0), 0.1).expect("front face");
        assert!((lit.light - 0.1).abs() < EPS);
    }

    #[test]
    fn test_shade_skips_degenerate() {
        let p = Vec4::new(1.0, 1.0, 1.0);
        let tri = Triangle::new(p, p, p);
        assert!(shade(&tri, Vec4::ZERO, Vec4::with_w(0.0, 0.0, -1.0, 0.0), 0.1).is_none());
    }

    #[test]
    fn test_project_identity_is_viewport_only() {
        let mut tri = Triangle::new(
            Vec4::new(0.5, -0.5, 0.25),
            Vec4::new(-1.0, 1.0, 0.5),
            Vec4::new(0.0, 0.0, 0.0),
        );
        tri.uv[1] = Uv::new(0.3, 0.7);
        tri.light = 0.4;
        let out = project(&tri, &Mat4::IDENTITY, 0.0, 200.0, 100.0).expect("finite");
        for (a, b) in tri.p.iter().zip(out.p.iter()) {
            assert!(((a.x + 1.0) * 100.0 - b.x).abs() < EPS);
            assert!(((a.y + 1.0) * 50.0 - b.y).abs() < EPS);
            assert!((a.z - b.z).abs() < EPS);
        }
        assert_eq!(out.uv, tri.uv);
        assert_eq!(out.light, tri.light);
    }

    #[test]
    fn test_project_divides_by_biased_w() {
        let tri = Triangle::new(Vec4::new(2.0, 0.0, 0.0), Vec4::ZERO, Vec4::ZERO);
        // w = 1, bias 1 => x halves
        let out = project(&tri, &Mat4::IDENTITY, 1.0, 2.0, 2.0).expect("finite");
        assert!((out.p[0].x - 2.0).abs() < EPS);
    }

    #[test]
    fn test_project_zero_divisor_dropped() {
        let tri = Triangle::new(Vec4::ZERO, Vec4::ZERO, Vec4::ZERO);
        assert!(project(&tri, &Mat4::IDENTITY, -1.0, 100.0, 100.0).is_none());
    }

    #[test]
    fn test_depth_sort_descending_and_stable() {
        let at = |z: f32, light: f32| {
            let mut t = Triangle::new(Vec4::new(0.0, 0.0, z), Vec4::new(1.0, 0.0, z), Vec4::new(0.0, 1.0, z));
            t.light = light;
            t
        };
        let mut tris = vec![at(1.0, 0.0), at(3.0, 0.1), at(2.0, 0.2), at(3.0, 0.3)];
        depth_sort(&mut tris);

        let zs: Vec<f32> = tris.iter().map(|t| t.avg_z()).collect();
        assert!(zs.windows(2).all(|w| w[0] >= w[1]));
        // Equal depths keep input order
        assert_eq!(tris[0].light, 0.1);
        assert_eq!(tris[1].light, 0.3);
    }

    #[test]
    fn test_world_matrix_default_places_mesh_ahead() {
        let state = RendererState::new(PipelineSettings::default());
        let p = state.world_matrix().transform(Vec4::new(1.0, 2.0, 0.0));
        assert!((p.x + 1.0).abs() < EPS);
        assert!((p.y + 2.0).abs() < EPS);
        assert!((p.z - 16.0).abs() < EPS);
    }

    #[test]
    fn test_triangle_in_front_survives_whole_pipeline() {
        let mut state = RendererState::new(flat_settings());
        let mesh = Mesh::new(vec![facing_camera_at_z5()]);
        let out = state.process(&mesh, 1080, 720).to_vec();

        assert_eq!(out.len(), 1);
        let t = out[0];
        for p in &t.p {
            assert!(p.x >= 0.0 && p.x <= 1079.0);
            assert!(p.y >= 0.0 && p.y <= 719.0);
        }
        let area = (t.p[1].x - t.p[0].x) * (t.p[2].y - t.p[0].y)
            - (t.p[2].x - t.p[0].x) * (t.p[1].y - t.p[0].y);
        assert!(area.abs() > 1.0);
        assert_eq!(state.stats, FrameStats { input: 1, visible: 1, projected: 1, drawn: 1 });
    }

    #[test]
    fn test_near_clip_is_untouched_in_front() {
        let tri = facing_camera_at_z5();
        assert_eq!(clip_triangle(&Plane::near(0.1), &tri), Clipped::One(tri));
    }

    #[test]
    fn test_triangle_behind_camera_is_discarded() {
        let mut state = RendererState::new(flat_settings());
        // Front-facing relative to the camera but at negative z
        let behind = Triangle::new(
            Vec4::new(0.0, 0.0, -5.0),
            Vec4::new(1.0, 0.0, -5.0),
            Vec4::new(0.0, 1.0, -5.0),
        );
        assert!(shade(&behind, Vec4::ZERO, state.settings.light_dir, 0.1).is_some());
        assert!(clip_triangle(&Plane::near(0.1), &behind).is_empty());

        let out = state.process(&Mesh::new(vec![behind]), 1080, 720);
        assert!(out.is_empty());
        assert_eq!(state.stats.visible, 1);
        assert_eq!(state.stats.projected, 0);
    }

    #[test]
    fn test_zero_viewport_is_noop() {
        let mut state = RendererState::new(flat_settings());
        let mesh = Mesh::new(vec![facing_camera_at_z5()]);
        assert!(state.process(&mesh, 0, 720).is_empty());
        assert!(state.process(&mesh, 1080, 0).is_empty());
    }

    #[test]
    fn test_huge_uvs_render_textured() {
        let src = "v 0 0 5\nv 0 1 5\nv 1 0 5\nvt 1e10 1e10\nvt -1e10 1e10\nvt 0 0\nf 1/1 2/2 3/3\n";
        let mesh = load_mesh_from_str(src).unwrap();
        let mut state = RendererState::new(PipelineSettings {
            textured: true,
            ..flat_settings()
        });
        let mut tex = Texture::checkerboard(32, 32, Color::WHITE, Color::BLACK);
        tex.pixels[0] = Color::MAGENTA;
        let mut fb = Framebuffer::new(320, 240);
        fb.clear(Color::BLACK);

        state.render(&mesh, &mut fb, Some(&tex));
        assert_eq!(state.stats.drawn, 1);
        let magenta = Color::MAGENTA.to_bytes();
        assert!(fb.pixels.chunks_exact(4).any(|p| p == magenta));
    }

    #[test]
    fn test_default_scene_draws_cube() {
        let mut state = RendererState::new(PipelineSettings::default());
        let drawn = state.process(&Mesh::cube(), 320, 240).len();
        // At most three faces of a cube face the camera, two triangles each
        assert!(drawn >= 1);
        assert!(state.stats.visible >= 1 && state.stats.visible <= 6);
        assert!(state.stats.visible < state.stats.input);
    }
}
