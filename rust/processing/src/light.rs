// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring light mounted next to the camera.

use nalgebra::{Rotation3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tdg_core::CameraPose;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    /// Nominal energy; per-pose energy is drawn from `[0.3, 3]` times this
    pub base_energy: u64,
    /// Light position in the camera frame (camera to LED distance)
    pub offset: [f64; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            base_energy: 140_000,
            offset: [0.0, 3.0, 0.0],
        }
    }
}

/// World position of a light rigidly attached to the camera.
///
/// `location + Rz(C) * Ry(B) * Rx(A) * offset` with `(A, B, C)` the pose
/// rotation.
pub fn light_location(pose: &CameraPose, offset: [f64; 3]) -> [f64; 3] {
    let [a, b, c] = pose.rotation;
    let rotation = Rotation3::from_euler_angles(a, b, c);
    let moved = rotation * Vector3::from(offset) + Vector3::from(pose.location);
    [moved.x, moved.y, moved.z]
}

/// Draw a light energy uniformly from `[0.3 E, 3 E]`, bounds included
pub fn draw_light_energy<R: Rng + ?Sized>(base_energy: u64, rng: &mut R) -> u64 {
    let low = (base_energy as f64 * 0.3).round() as u64;
    let high = base_energy.saturating_mul(3);
    rng.random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_rotation_adds_offset() {
        let pose = CameraPose::new([1.0, 2.0, 3.0], [0.0; 3]);
        assert_eq!(light_location(&pose, [0.0, 3.0, 0.0]), [1.0, 5.0, 3.0]);
    }

    #[test]
    fn test_single_axis_rotations() {
        let offset = [0.0, 3.0, 0.0];

        // yaw by C: +Y swings to -X
        let yaw = CameraPose::new([0.0; 3], [0.0, 0.0, FRAC_PI_2]);
        let l = light_location(&yaw, offset);
        assert_relative_eq!(l[0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(l[1], 0.0, epsilon = 1e-12);

        // roll by A: +Y swings to +Z
        let roll = CameraPose::new([0.0; 3], [FRAC_PI_2, 0.0, 0.0]);
        let l = light_location(&roll, offset);
        assert_relative_eq!(l[2], 3.0, epsilon = 1e-12);

        // pitch by B leaves a Y offset alone
        let pitch = CameraPose::new([0.0; 3], [0.0, 1.2, 0.0]);
        let l = light_location(&pitch, offset);
        assert_relative_eq!(l[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_order_is_z_y_x() {
        let (a, b, c) = (0.3, -0.7, 1.1);
        let pose = CameraPose::new([5.0, -2.0, 0.5], [a, b, c]);
        let offset = Vector3::new(0.4, 3.0, -0.2);

        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), c)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), b)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), a)
            * offset
            + Vector3::new(5.0, -2.0, 0.5);

        let l = light_location(&pose, [offset.x, offset.y, offset.z]);
        assert_relative_eq!(Vector3::from(l), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_energy_bounds() {
        let mut rng = seeded_rng(2);
        for _ in 0..1000 {
            let e = draw_light_energy(140_000, &mut rng);
            assert!((42_000..=420_000).contains(&e));
        }
    }
}
