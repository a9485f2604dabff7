//! Plane clipping for triangles
//!
//! One routine serves both the view-space near plane and the four screen
//! edges. Every call yields whole triangles: zero, one or two of them.

use super::math::{Uv, Vec4};
use super::types::Triangle;

/// Half-space boundary. Points with `distance >= 0` are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec4,
    pub normal: Vec4,
}

impl Plane {
    /// The normal is normalized here, so callers may pass any length
    pub fn new(point: Vec4, normal: Vec4) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// View-space near plane at `z = near`, facing the scene
    pub fn near(near: f32) -> Self {
        Plane::new(Vec4::new(0.0, 0.0, near), Vec4::with_w(0.0, 0.0, 1.0, 0.0))
    }

    pub fn distance(&self, p: Vec4) -> f32 {
        self.normal.dot(p) - self.normal.dot(self.point)
    }

    /// Where the segment start..end crosses the plane, and the parameter `t`
    /// along the segment
    pub fn intersect(&self, start: Vec4, end: Vec4) -> (Vec4, f32) {
        let plane_d = -self.normal.dot(self.point);
        let ad = start.dot(self.normal);
        let bd = end.dot(self.normal);
        let t = (-plane_d - ad) / (bd - ad);
        (start.lerp(end, t), t)
    }
}

/// Output of clipping one triangle against one plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clipped {
    None,
    One(Triangle),
    Two(Triangle, Triangle),
}

impl Clipped {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        match self {
            Clipped::None => 0,
            Clipped::One(_) => 1,
            Clipped::Two(_, _) => 2,
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        matches!(self, Clipped::None)
    }

    pub fn push_into(self, out: &mut Vec<Triangle>) {
        match self {
            Clipped::None => {}
            Clipped::One(a) => out.push(a),
            Clipped::Two(a, b) => {
                out.push(a);
                out.push(b);
            }
        }
    }
}

/// Clip a triangle against a plane.
///
/// New vertices sit where edges cross the plane, with UVs interpolated by
/// the same parameter. Outputs keep the source lighting.
pub fn clip_triangle(plane: &Plane, tri: &Triangle) -> Clipped {
    let mut inside: [(Vec4, Uv); 3] = [(Vec4::ZERO, Uv::default()); 3];
    let mut outside: [(Vec4, Uv); 3] = [(Vec4::ZERO, Uv::default()); 3];
    let mut n_in = 0;
    let mut n_out = 0;

    for i in 0..3 {
        if plane.distance(tri.p[i]) >= 0.0 {
            inside[n_in] = (tri.p[i], tri.uv[i]);
            n_in += 1;
        } else {
            outside[n_out] = (tri.p[i], tri.uv[i]);
            n_out += 1;
        }
    }

    let cut = |from: (Vec4, Uv), to: (Vec4, Uv)| -> (Vec4, Uv) {
        let (p, t) = plane.intersect(from.0, to.0);
        (p, from.1.lerp(to.1, t))
    };

    match n_in {
        0 => Clipped::None,
        3 => Clipped::One(*tri),
        1 => {
            let a = cut(inside[0], outside[0]);
            let b = cut(inside[0], outside[1]);
            Clipped::One(Triangle {
                p: [inside[0].0, a.0, b.0],
                uv: [inside[0].1, a.1, b.1],
                light: tri.light,
            })
        }
        _ => {
            // Quad split
            let a = cut(inside[0], outside[0]);
            let first = Triangle {
                p: [inside[0].0, inside[1].0, a.0],
                uv: [inside[0].1, inside[1].1, a.1],
                light: tri.light,
            };
            let b = cut(inside[1], outside[0]);
            let second = Triangle {
                p: [inside[1].0, a.0, b.0],
                uv: [inside[1].1, a.1, b.1],
                light: tri.light,
            };
            Clipped::Two(first, second)
        }
    }
}

/// Viewport edges in clipping order: top, bottom, left, right
pub fn screen_planes(width: usize, height: usize) -> [Plane; 4] {
    let right = width as f32 - 1.0;
    let bottom = height as f32 - 1.0;
    [
        Plane::new(Vec4::new(0.0, 0.0, 0.0), Vec4::with_w(0.0, 1.0, 0.0, 0.0)),
        Plane::new(Vec4::new(0.0, bottom, 0.0), Vec4::with_w(0.0, -1.0, 0.0, 0.0)),
        Plane::new(Vec4::new(0.0, 0.0, 0.0), Vec4::with_w(1.0, 0.0, 0.0, 0.0)),
        Plane::new(Vec4::new(right, 0.0, 0.0), Vec4::with_w(-1.0, 0.0, 0.0, 0.0)),
    ]
}

/// Clip one screen-space triangle to the viewport.
///
/// Each edge drains the whole queue before the next edge runs. Survivors
/// are appended to `out`; `scratch` is reused between calls.
pub fn clip_to_screen(
    tri: &Triangle,
    planes: &[Plane; 4],
    queue: &mut Vec<Triangle>,
    scratch: &mut Vec<Triangle>,
    out: &mut Vec<Triangle>,
) {
    queue.clear();
    queue.push(*tri);

    for plane in planes {
        scratch.clear();
        for t in queue.iter() {
            clip_triangle(plane, t).push_into(scratch);
        }
        std::mem::swap(queue, scratch);
        if queue.is_empty() {
            return;
        }
    }

    out.extend_from_slice(queue);
}
