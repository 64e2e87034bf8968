// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera pose augmentation around the programmed inspection path.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tdg_core::CameraPose;

use crate::uniform;

/// Jitter applied to every emitted pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseJitter {
    /// Extra poses emitted per base pose, on top of the base pose itself
    pub variants_per_pose: usize,
    /// Half-width of the location jitter in model units
    pub location: f64,
    /// Half-width of the rotation jitter in radians (about 2 degrees)
    pub rotation: f64,
}

impl Default for PoseJitter {
    fn default() -> Self {
        Self {
            variants_per_pose: 2,
            location: 0.1,
            rotation: 0.0349,
        }
    }
}

impl PoseJitter {
    pub fn apply<R: Rng + ?Sized>(&self, pose: &CameraPose, rng: &mut R) -> CameraPose {
        let mut out = *pose;
        for v in out.location.iter_mut() {
            *v += uniform(rng, -self.location, self.location);
        }
        for v in out.rotation.iter_mut() {
            *v += uniform(rng, -self.rotation, self.rotation);
        }
        out
    }
}

/// Expand each base pose into `1 + variants_per_pose` jittered copies.
///
/// Copies are independent: each one is jittered once from its base pose, and
/// the base poses themselves are not modified.
pub fn jitter_poses<R: Rng + ?Sized>(
    base: &[CameraPose],
    jitter: &PoseJitter,
    rng: &mut R,
) -> Vec<CameraPose> {
    let copies = 1 + jitter.variants_per_pose;
    let mut poses = Vec::with_capacity(base.len() * copies);
    for pose in base {
        for _ in 0..copies {
            poses.push(jitter.apply(pose, rng));
        }
    }
    poses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn test_each_pose_yields_three_jittered_copies() {
        let base = vec![
            CameraPose::new([10.0, 20.0, 30.0], [0.0, 1.0, 2.0]),
            CameraPose::new([-5.0, 0.0, 5.0], [3.0, 0.0, -1.0]),
        ];
        let poses = jitter_poses(&base, &PoseJitter::default(), &mut seeded_rng(4));
        assert_eq!(poses.len(), 6);

        for (i, pose) in poses.iter().enumerate() {
            let origin = &base[i / 3];
            for k in 0..3 {
                assert!((pose.location[k] - origin.location[k]).abs() <= 0.1);
                assert!((pose.rotation[k] - origin.rotation[k]).abs() <= 0.0349);
            }
        }
        // copies are drawn independently
        assert_ne!(poses[0], poses[1]);
    }

    #[test]
    fn test_no_variants_still_jitters_base() {
        let jitter = PoseJitter {
            variants_per_pose: 0,
            ..PoseJitter::default()
        };
        let base = [CameraPose::default()];
        let poses = jitter_poses(&base, &jitter, &mut seeded_rng(9));
        assert_eq!(poses.len(), 1);
        assert_ne!(poses[0], base[0]);
    }
}
