//! TDG Geometry
//!
//! Triangle meshes, defect tool primitives, coherent-noise displacement and
//! boolean carving (via csgrs) used by the defect synthesis engine.

pub mod csg;
pub mod displacement;
pub mod error;
pub mod mesh;
pub mod primitives;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use csg::{calculate_smooth_normals, solidify, BooleanProcessor};
pub use displacement::NoiseDisplace;
pub use error::{Error, Result};
pub use mesh::{Mesh, SurfacePoint};
pub use primitives::{box_mesh, uv_sphere};
