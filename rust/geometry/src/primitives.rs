// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed primitive meshes with outward winding.
//!
//! The UV sphere is the default defect tool blank; the box is mostly used as
//! a stand-in part in tests and demos.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Create a box mesh from AABB min/max bounds.
/// Returns a mesh with 12 triangles (2 per face, 6 faces), one vertex per
/// corner so the surface is welded.
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 36);

    let corners = [
        Point3::new(min.x, min.y, min.z), // 0: front-bottom-left
        Point3::new(max.x, min.y, min.z), // 1: front-bottom-right
        Point3::new(max.x, max.y, min.z), // 2: front-top-right
        Point3::new(min.x, max.y, min.z), // 3: front-top-left
        Point3::new(min.x, min.y, max.z), // 4: back-bottom-left
        Point3::new(max.x, min.y, max.z), // 5: back-bottom-right
        Point3::new(max.x, max.y, max.z), // 6: back-top-right
        Point3::new(min.x, max.y, max.z), // 7: back-top-left
    ];
    let center = Point3::from((min.coords + max.coords) * 0.5);

    for corner in &corners {
        let normal = (corner - center)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::z);
        mesh.add_vertex(*corner, normal);
    }

    // Counter-clockwise winding when viewed from outside
    const FACES: [[u32; 3]; 12] = [
        [0, 2, 1], [0, 3, 2], // -Z
        [4, 5, 6], [4, 6, 7], // +Z
        [0, 4, 7], [0, 7, 3], // -X
        [1, 2, 6], [1, 6, 5], // +X
        [0, 1, 5], [0, 5, 4], // -Y
        [3, 7, 6], [3, 6, 2], // +Y
    ];
    for [a, b, c] in FACES {
        mesh.add_triangle(a, b, c);
    }

    mesh
}

/// Welded UV sphere centred on the origin.
///
/// `segments` is the number of longitude slices (>= 3), `rings` the number of
/// latitude bands (>= 2). Vertex normals point radially outward.
pub fn uv_sphere(radius: f64, segments: u32, rings: u32) -> Result<Mesh> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(Error::InvalidPrimitive(format!(
            "sphere radius must be positive, got {}",
            radius
        )));
    }
    if segments < 3 || rings < 2 {
        return Err(Error::InvalidPrimitive(format!(
            "sphere needs at least 3 segments and 2 rings, got {}x{}",
            segments, rings
        )));
    }

    let ring_vertices = (rings - 1) * segments;
    let mut mesh = Mesh::with_capacity(
        (ring_vertices + 2) as usize,
        (segments * rings * 6) as usize,
    );

    mesh.add_vertex(Point3::new(0.0, 0.0, radius), Vector3::z());
    for i in 1..rings {
        let theta = PI * i as f64 / rings as f64;
        for j in 0..segments {
            let phi = 2.0 * PI * j as f64 / segments as f64;
            let dir = Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
            mesh.add_vertex(Point3::from(dir * radius), dir);
        }
    }
    mesh.add_vertex(Point3::new(0.0, 0.0, -radius), -Vector3::z());

    let north = 0u32;
    let south = ring_vertices + 1;
    let ring_start = |i: u32| 1 + (i - 1) * segments;

    for j in 0..segments {
        let next = (j + 1) % segments;
        mesh.add_triangle(north, ring_start(1) + j, ring_start(1) + next);
    }

    for i in 1..rings - 1 {
        let upper = ring_start(i);
        let lower = ring_start(i + 1);
        for j in 0..segments {
            let next = (j + 1) % segments;
            mesh.add_triangle(upper + j, lower + j, lower + next);
            mesh.add_triangle(upper + j, lower + next, upper + next);
        }
    }

    let last = ring_start(rings - 1);
    for j in 0..segments {
        let next = (j + 1) % segments;
        mesh.add_triangle(south, last + next, last + j);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_has_twelve_triangles() {
        let mesh = box_mesh(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_topology() {
        let mesh = uv_sphere(1.0, 16, 8).unwrap();
        assert_eq!(mesh.vertex_count(), 7 * 16 + 2);
        assert_eq!(mesh.triangle_count(), 2 * 16 * 7);
    }

    #[test]
    fn test_sphere_is_outward_and_close_to_analytic_volume() {
        let mesh = uv_sphere(0.5, 48, 24).unwrap();
        let analytic = 4.0 / 3.0 * PI * 0.125;
        let volume = mesh.signed_volume();
        assert!(volume > 0.0);
        assert!((volume - analytic).abs() / analytic < 0.02);
    }

    #[test]
    fn test_sphere_normals_are_radial() {
        let mesh = uv_sphere(2.0, 8, 4).unwrap();
        for i in 0..mesh.vertex_count() {
            let p = mesh.position(i);
            let n = mesh.normal(i);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(p.coords.normalize().dot(&n), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sphere_rejects_bad_parameters() {
        assert!(uv_sphere(0.0, 8, 4).is_err());
        assert!(uv_sphere(1.0, 2, 4).is_err());
        assert!(uv_sphere(1.0, 8, 1).is_err());
    }
}
