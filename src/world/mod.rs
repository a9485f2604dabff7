//! World module - mesh input for the pipeline
//!
//! Meshes arrive as a flat triangle list in object space, loaded from
//! OBJ-style vertex/face text.

mod obj;

pub use obj::*;
