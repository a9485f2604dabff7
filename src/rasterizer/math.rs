//! Homogeneous vector and matrix math for the triangle pipeline
//!
//! Row-vector convention throughout: a point is transformed as `v' = v * M`,
//! and `a * b` is the matrix that applies `a` first, then `b`.

use std::ops::{Add, Div, Mul, Sub};
use serde::{Serialize, Deserialize};

/// Homogeneous 3D point/vector.
///
/// Positions carry `w = 1`. Differences of positions end up with `w = 0`,
/// which is what direction vectors should have anyway; `dot`, `cross` and
/// `len` only look at x/y/z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default = "one")]
    pub w: f32,
}

fn one() -> f32 {
    1.0
}

impl Default for Vec4 {
    fn default() -> Self {
        Vec4::ZERO
    }
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };
    pub const UP: Vec4 = Vec4 { x: 0.0, y: 1.0, z: 0.0, w: 1.0 };
    pub const FORWARD: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 1.0, w: 1.0 };

    /// A position (`w = 1`)
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    pub fn with_w(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
            w: 0.0,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy; a zero vector stays zero
    pub fn normalize(self) -> Vec4 {
        let l = self.len();
        if l == 0.0 {
            return Vec4 { x: 0.0, y: 0.0, z: 0.0, w: self.w };
        }
        Vec4 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
            w: self.w,
        }
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Linear interpolation of all four components
    pub fn lerp(self, other: Vec4, t: f32) -> Vec4 {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        self.scale(s)
    }
}

impl Div<f32> for Vec4 {
    type Output = Vec4;
    fn div(self, s: f32) -> Vec4 {
        self.scale(1.0 / s)
    }
}

/// 2D screen-space point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Vec4> for Vec2 {
    fn from(v: Vec4) -> Self {
        Vec2::new(v.x, v.y)
    }
}

/// Texture coordinate. `w` rides along through clipping but texturing is affine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uv {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

impl Default for Uv {
    fn default() -> Self {
        Self { u: 0.0, v: 0.0, w: 1.0 }
    }
}

impl Uv {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v, w: 1.0 }
    }

    pub fn lerp(self, other: Uv, t: f32) -> Uv {
        Uv {
            u: self.u + t * (other.u - self.u),
            v: self.v + t * (other.v - self.v),
            w: self.w + t * (other.w - self.w),
        }
    }
}

/// 4x4 row-major matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub fn identity() -> Self {
        Mat4::IDENTITY
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut r = Mat4::IDENTITY;
        r.m[1][1] = c;
        r.m[1][2] = s;
        r.m[2][1] = -s;
        r.m[2][2] = c;
        r
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut r = Mat4::IDENTITY;
        r.m[0][0] = c;
        r.m[0][2] = s;
        r.m[2][0] = -s;
        r.m[2][2] = c;
        r
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut r = Mat4::IDENTITY;
        r.m[0][0] = c;
        r.m[0][1] = s;
        r.m[1][0] = -s;
        r.m[1][1] = c;
        r
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut r = Mat4::IDENTITY;
        r.m[3][0] = x;
        r.m[3][1] = y;
        r.m[3][2] = z;
        r
    }

    /// Perspective projection. `aspect` is height / width.
    pub fn projection(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let fov_rad = 1.0 / (fov_deg * 0.5).to_radians().tan();
        let mut r = Mat4::ZERO;
        r.m[0][0] = aspect * fov_rad;
        r.m[1][1] = fov_rad;
        r.m[2][2] = far / (far - near);
        r.m[3][2] = (-far * near) / (far - near);
        r.m[2][3] = 1.0;
        r.m[3][3] = 0.0;
        r
    }

    /// Orientation + placement of an object at `pos` facing `target`
    pub fn point_at(pos: Vec4, target: Vec4, up: Vec4) -> Self {
        let forward = (target - pos).normalize();

        // Re-orthogonalize up against forward
        let a = forward * up.dot(forward);
        let new_up = (up - a).normalize();

        let right = new_up.cross(forward);

        Mat4 {
            m: [
                [right.x, right.y, right.z, 0.0],
                [new_up.x, new_up.y, new_up.z, 0.0],
                [forward.x, forward.y, forward.z, 0.0],
                [pos.x, pos.y, pos.z, 1.0],
            ],
        }
    }

    /// Inverse of a rotation+translation matrix (such as `point_at`).
    /// Only valid when the 3x3 block is orthonormal.
    pub fn quick_inverse(&self) -> Self {
        let m = &self.m;
        let mut r = Mat4::ZERO;
        r.m[0][0] = m[0][0];
        r.m[0][1] = m[1][0];
        r.m[0][2] = m[2][0];
        r.m[1][0] = m[0][1];
        r.m[1][1] = m[1][1];
        r.m[1][2] = m[2][1];
        r.m[2][0] = m[0][2];
        r.m[2][1] = m[1][2];
        r.m[2][2] = m[2][2];
        r.m[3][0] = -(m[3][0] * r.m[0][0] + m[3][1] * r.m[1][0] + m[3][2] * r.m[2][0]);
        r.m[3][1] = -(m[3][0] * r.m[0][1] + m[3][1] * r.m[1][1] + m[3][2] * r.m[2][1]);
        r.m[3][2] = -(m[3][0] * r.m[0][2] + m[3][1] * r.m[1][2] + m[3][2] * r.m[2][2]);
        r.m[3][3] = 1.0;
        r
    }

    /// `v * self`, no perspective divide
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: v.x * m[0][0] + v.y * m[1][0] + v.z * m[2][0] + v.w * m[3][0],
            y: v.x * m[0][1] + v.y * m[1][1] + v.z * m[2][1] + v.w * m[3][1],
            z: v.x * m[0][2] + v.y * m[1][2] + v.z * m[2][2] + v.w * m[3][2],
            w: v.x * m[0][3] + v.y * m[1][3] + v.z * m[2][3] + v.w * m[3][3],
        }
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut r = Mat4::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                r.m[row][col] = self.m[row][0] * other.m[0][col]
                    + self.m[row][1] * other.m[1][col]
                    + self.m[row][2] * other.m[2][col]
                    + self.m[row][3] * other.m[3][col];
            }
        }
        r
    }
}
