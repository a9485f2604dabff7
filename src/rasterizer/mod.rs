//! Software triangle pipeline
//!
//! Features:
//! - Row-vector homogeneous transforms with a look-at camera
//! - Back-face culling and flat diffuse lighting
//! - Near-plane and viewport-edge clipping
//! - Painter's algorithm (no depth buffer)
//! - Affine texture mapping

mod math;
mod types;
mod clip;
mod pipeline;
mod render;

pub use math::*;
pub use types::*;
pub use pipeline::*;
pub use render::*;
