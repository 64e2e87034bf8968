// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Boolean carve/intersect via csgrs, plus the shell ("solidify") and smooth
//! normal passes that run around them.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Boolean operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Difference,
    Intersection,
}

/// Boolean processor wrapping the csgrs BSP implementation
#[derive(Debug, Clone)]
pub struct BooleanProcessor {
    /// Minimum vertex count an operand needs to be considered a solid
    pub min_vertices: usize,
}

impl BooleanProcessor {
    /// Create a new boolean processor
    pub fn new() -> Self {
        Self { min_vertices: 3 }
    }

    /// Subtract `tool` from `host` (host − tool).
    ///
    /// An empty tool leaves the host unchanged. A tool with non-finite
    /// coordinates is rejected rather than fed to the BSP tree.
    pub fn subtract_mesh(&self, host: &Mesh, tool: &Mesh) -> Result<Mesh> {
        if tool.is_empty() {
            return Ok(host.clone());
        }
        if host.is_empty() {
            return Ok(Mesh::new());
        }
        self.validate_operand(host, "host")?;
        self.validate_operand(tool, "tool")?;
        self.apply(host, tool, BooleanOp::Difference)
    }

    /// Keep only the part of `host` that overlaps `tool` (host ∩ tool).
    pub fn intersect_mesh(&self, host: &Mesh, tool: &Mesh) -> Result<Mesh> {
        if host.is_empty() || tool.is_empty() {
            return Ok(Mesh::new());
        }
        self.validate_operand(host, "host")?;
        self.validate_operand(tool, "tool")?;
        self.apply(host, tool, BooleanOp::Intersection)
    }

    fn apply(&self, host: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh> {
        use csgrs::traits::CSG;

        let host_csg = Self::mesh_to_csgrs(host);
        let tool_csg = Self::mesh_to_csgrs(tool);

        if host_csg.polygons.is_empty() || tool_csg.polygons.is_empty() {
            return Err(Error::InvalidOperand(format!(
                "{:?} operand has only degenerate triangles",
                op
            )));
        }

        let result = match op {
            BooleanOp::Difference => host_csg.difference(&tool_csg),
            BooleanOp::Intersection => host_csg.intersection(&tool_csg),
        };

        Ok(Self::csgrs_to_mesh(&result))
    }

    fn validate_operand(&self, mesh: &Mesh, role: &str) -> Result<()> {
        if mesh.vertex_count() < self.min_vertices || mesh.triangle_count() == 0 {
            return Err(Error::InvalidOperand(format!(
                "{} mesh has {} vertices and {} triangles",
                role,
                mesh.vertex_count(),
                mesh.triangle_count()
            )));
        }
        if !mesh.is_finite() {
            return Err(Error::InvalidOperand(format!(
                "{} mesh contains non-finite coordinates",
                role
            )));
        }
        Ok(())
    }

    /// Convert our Mesh format to csgrs Mesh format
    fn mesh_to_csgrs(mesh: &Mesh) -> csgrs::mesh::Mesh<()> {
        use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};

        let mut polygons = Vec::with_capacity(mesh.triangle_count());

        for t in 0..mesh.triangle_count() {
            let [v0, v1, v2] = mesh.triangle(t);

            // Skip degenerate (zero-area/collinear) triangles to avoid NaN propagation
            let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12) {
                Some(n) => n,
                None => continue,
            };

            let vertices = vec![
                Vertex::new(v0, face_normal),
                Vertex::new(v1, face_normal),
                Vertex::new(v2, face_normal),
            ];

            polygons.push(Polygon::new(vertices, None));
        }

        CSGMesh::from_polygons(&polygons, None)
    }

    /// Convert csgrs Mesh format back to our Mesh format.
    ///
    /// BSP splitting of triangles only ever yields convex polygons, so a fan
    /// from the first vertex is a valid triangulation.
    fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Mesh {
        let mut mesh = Mesh::new();

        for polygon in &csg_mesh.polygons {
            let vertices = &polygon.vertices;
            if vertices.len() < 3 {
                continue;
            }

            let raw_normal = Vector3::new(
                vertices[0].normal[0],
                vertices[0].normal[1],
                vertices[0].normal[2],
            );
            let normal = match raw_normal.try_normalize(1e-10) {
                Some(n) if n.iter().all(|c| c.is_finite()) => n,
                _ => {
                    let points: Vec<Point3<f64>> = vertices.iter().map(|v| v.pos).collect();
                    match newell_normal(&points).try_normalize(1e-10) {
                        Some(n) => n,
                        None => continue,
                    }
                }
            };

            let base_idx = mesh.vertex_count() as u32;
            for v in vertices {
                mesh.add_vertex(v.pos, normal);
            }
            for i in 1..vertices.len() as u32 - 1 {
                mesh.add_triangle(base_idx, base_idx + i, base_idx + i + 1);
            }
        }

        mesh
    }
}

impl Default for BooleanProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Polygon normal by Newell's method (unnormalized)
fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Quantize a position so coincident vertices of a triangle soup share a key
#[inline]
fn weld_key(p: &Point3<f64>) -> (i64, i64, i64) {
    const SCALE: f64 = 1e5;
    (
        (p.x * SCALE).round() as i64,
        (p.y * SCALE).round() as i64,
        (p.z * SCALE).round() as i64,
    )
}

/// Calculate smooth (area-weighted) vertex normals.
///
/// Vertices at the same position share one normal even when the mesh is an
/// unwelded triangle soup, which is what csgrs returns.
pub fn calculate_smooth_normals(mesh: &mut Mesh) {
    let vertex_count = mesh.vertex_count();
    if vertex_count == 0 {
        return;
    }

    let keys: Vec<(i64, i64, i64)> = (0..vertex_count)
        .map(|i| weld_key(&mesh.position(i)))
        .collect();
    let mut accumulated: FxHashMap<(i64, i64, i64), Vector3<f64>> = FxHashMap::default();

    for t in 0..mesh.triangle_count() {
        let [v0, v1, v2] = mesh.triangle(t);
        let face = (v1 - v0).cross(&(v2 - v0));
        for k in 0..3 {
            let idx = mesh.indices[t * 3 + k] as usize;
            *accumulated.entry(keys[idx]).or_insert_with(Vector3::zeros) += face;
        }
    }

    mesh.normals.resize(vertex_count * 3, 0.0);
    for (i, key) in keys.iter().enumerate() {
        let previous = mesh.normal(i);
        let normal = accumulated
            .get(key)
            .and_then(|n| n.try_normalize(1e-12))
            .unwrap_or(previous);
        mesh.normals[i * 3] = normal.x as f32;
        mesh.normals[i * 3 + 1] = normal.y as f32;
        mesh.normals[i * 3 + 2] = normal.z as f32;
    }
}

/// Thicken a closed surface into a shell of the given thickness.
///
/// The original surface is kept as the outer wall; an inner wall is offset
/// inward along smooth normals with reversed winding.
pub fn solidify(mesh: &Mesh, thickness: f64) -> Mesh {
    if mesh.is_empty() {
        return Mesh::new();
    }

    let mut outer = mesh.clone();
    calculate_smooth_normals(&mut outer);

    let mut inner = outer.clone();
    for i in 0..inner.vertex_count() {
        let p = inner.position(i) - inner.normal(i) * thickness;
        inner.positions[i * 3] = p.x as f32;
        inner.positions[i * 3 + 1] = p.y as f32;
        inner.positions[i * 3 + 2] = p.z as f32;
    }
    inner.flip();

    outer.merge(&inner);
    outer
}
