// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coherent-noise displacement for defect tools.
//!
//! Vertices move along their normals by a soft "clouds" field so every
//! defect gets an irregular silhouette instead of a perfect sphere.

use crate::csg::calculate_smooth_normals;
use crate::mesh::Mesh;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Displace mesh vertices along normals using layered Perlin noise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseDisplace {
    /// Displacement strength in model units; the field is centred on 0.5,
    /// so negative strengths push bumps inward
    pub strength: f64,
    /// Extra octaves on top of the base one
    pub depth: u32,
    /// Spatial size of the noise features (coordinates are divided by it)
    pub scale: f64,
    /// Perlin permutation seed
    pub seed: u32,
}

impl Default for NoiseDisplace {
    fn default() -> Self {
        Self {
            strength: 0.0,
            depth: 4,
            scale: 6.0,
            seed: 0,
        }
    }
}

impl NoiseDisplace {
    /// Soft cloud value in `[0, 1]` at a point
    pub fn sample(&self, noise: &Perlin, x: f64, y: f64, z: f64) -> f64 {
        let inv_scale = if self.scale.abs() > f64::EPSILON {
            1.0 / self.scale
        } else {
            1.0
        };

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = inv_scale;
        let mut max_value = 0.0;

        for _ in 0..=self.depth {
            total += noise.get([x * frequency, y * frequency, z * frequency]) * amplitude;
            max_value += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        (total / max_value * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Apply the displacement in place and recompute smooth normals
    pub fn apply(&self, mesh: &mut Mesh) {
        if self.strength == 0.0 || mesh.is_empty() {
            return;
        }

        let perlin = Perlin::new(self.seed);

        for i in 0..mesh.vertex_count() {
            let pos = mesh.position(i);
            let normal = mesh.normal(i);

            let value = self.sample(&perlin, pos.x, pos.y, pos.z);
            let displaced = pos + normal * (value - 0.5) * self.strength;

            let base = i * 3;
            mesh.positions[base] = displaced.x as f32;
            mesh.positions[base + 1] = displaced.y as f32;
            mesh.positions[base + 2] = displaced.z as f32;
        }

        calculate_smooth_normals(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::uv_sphere;

    #[test]
    fn test_sample_stays_in_unit_range() {
        let perlin = Perlin::new(7);
        let displace = NoiseDisplace {
            strength: 1.0,
            depth: 12,
            scale: 2.0,
            seed: 7,
        };
        for i in 0..200 {
            let t = i as f64 * 0.173;
            let v = displace.sample(&perlin, t, t * 0.5, -t);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let mut mesh = uv_sphere(1.0, 12, 6).unwrap();
        let before = mesh.clone();
        NoiseDisplace::default().apply(&mut mesh);
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_displacement_is_deterministic_and_bounded() {
        let displace = NoiseDisplace {
            strength: 0.8,
            depth: 6,
            scale: 3.0,
            seed: 0,
        };

        let mut a = uv_sphere(1.0, 24, 12).unwrap();
        let mut b = a.clone();
        displace.apply(&mut a);
        displace.apply(&mut b);
        assert_eq!(a, b);

        for i in 0..a.vertex_count() {
            let r = a.position(i).coords.norm();
            assert!(r >= 1.0 - 0.4 - 1e-4 && r <= 1.0 + 0.4 + 1e-4, "radius {}", r);
        }
    }
}
