//! Mesh loading
//!
//! Reads the vertex/face subset of Wavefront OBJ: `v`, `vt` and `f` lines.
//! Faces with more than three corners are fanned into triangles.

use std::fs;
use std::path::Path;
use crate::rasterizer::{Mesh, Triangle, Uv, Vec4};

/// Error type for mesh loading
#[derive(Debug)]
pub enum MeshError {
    IoError(std::io::Error),
    /// Malformed line (1-based line number)
    ParseError { line: usize, message: String },
    /// Face refers to a vertex or texture coordinate that doesn't exist
    IndexOutOfRange { line: usize, index: i64, len: usize },
}

impl From<std::io::Error> for MeshError {
    fn from(e: std::io::Error) -> Self {
        MeshError::IoError(e)
    }
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::IoError(e) => write!(f, "IO error: {}", e),
            MeshError::ParseError { line, message } => {
                write!(f, "Parse error on line {}: {}", line, message)
            }
            MeshError::IndexOutOfRange { line, index, len } => write!(
                f,
                "Index {} out of range on line {} ({} entries defined)",
                index, line, len
            ),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Load a mesh from an OBJ file
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh, MeshError> {
    let contents = fs::read_to_string(path)?;
    load_mesh_from_str(&contents)
}

/// Parse OBJ text into a mesh
pub fn load_mesh_from_str(s: &str) -> Result<Mesh, MeshError> {
    let mut verts: Vec<Vec4> = Vec::new();
    let mut uvs: Vec<Uv> = Vec::new();
    let mut tris: Vec<Triangle> = Vec::new();

    for (i, raw) in s.lines().enumerate() {
        let line = i + 1;
        let mut parts = raw.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut parts, line, "vertex")?;
                verts.push(Vec4::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&mut parts, line, "texture coordinate")?;
                uvs.push(Uv::new(u, v));
            }
            "f" => {
                let corners = parts
                    .map(|slot| parse_corner(slot, line, &verts, &uvs))
                    .collect::<Result<Vec<_>, _>>()?;

                if corners.len() < 3 {
                    return Err(MeshError::ParseError {
                        line,
                        message: format!("face needs at least 3 corners, got {}", corners.len()),
                    });
                }

                // (a, b, c), (a, c, d), ...
                for k in 1..corners.len() - 1 {
                    let (a, b, c) = (corners[0], corners[k], corners[k + 1]);
                    tris.push(Triangle::with_uv([a.0, b.0, c.0], [a.1, b.1, c.1]));
                }
            }
            // Comments, normals, groups, materials
            _ => {}
        }
    }

    Ok(Mesh::new(tris))
}

fn parse_floats<const N: usize>(
    parts: &mut std::str::SplitWhitespace<'_>,
    line: usize,
    what: &str,
) -> Result<[f32; N], MeshError> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        let token = parts.next().ok_or_else(|| MeshError::ParseError {
            line,
            message: format!("{} needs {} components", what, N),
        })?;
        *slot = token.parse::<f32>().map_err(|e| MeshError::ParseError {
            line,
            message: format!("bad number '{}': {}", token, e),
        })?;
    }
    Ok(out)
}

/// One `f` slot: `v`, `v/t`, `v/t/n` or `v//n`
fn parse_corner(slot: &str, line: usize, verts: &[Vec4], uvs: &[Uv]) -> Result<(Vec4, Uv), MeshError> {
    let mut fields = slot.split('/');
    let v = fields.next().unwrap_or_default();
    let pos = verts[resolve_index(v, line, verts.len())?];

    let uv = match fields.next() {
        Some(t) if !t.is_empty() => uvs[resolve_index(t, line, uvs.len())?],
        _ => Uv::default(),
    };

    Ok((pos, uv))
}

/// 1-based index, negative counts back from the end
fn resolve_index(token: &str, line: usize, len: usize) -> Result<usize, MeshError> {
    let index: i64 = token.parse().map_err(|e| MeshError::ParseError {
        line,
        message: format!("bad index '{}': {}", token, e),
    })?;

    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };

    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(MeshError::IndexOutOfRange { line, index, len });
    }
    Ok(resolved as usize)
}
