// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera poses along the inspection path and the camera-position file
//! handed to the external renderer.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::parser::parse_pose_record;

/// Camera location plus Euler rotation (A, B, C in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraPose {
    pub location: [f64; 3],
    pub rotation: [f64; 3],
}

impl CameraPose {
    pub fn new(location: [f64; 3], rotation: [f64; 3]) -> Self {
        Self { location, rotation }
    }

    /// Single line of six space-separated floats: location then rotation
    pub fn to_camera_line(&self) -> String {
        self.location
            .iter()
            .chain(self.rotation.iter())
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parse a whole inspection-path document. Blank lines are skipped; any
/// malformed line aborts with its line number.
pub fn parse_inspection_path(content: &str) -> Result<Vec<CameraPose>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_pose_record(line, i + 1))
        .collect()
}

/// Read and parse an inspection-path file
pub fn load_inspection_path(path: impl AsRef<Path>) -> Result<Vec<CameraPose>> {
    let content = fs::read_to_string(path)?;
    parse_inspection_path(&content)
}

/// Overwrite the camera-position file with a single pose
pub fn write_camera_file(path: impl AsRef<Path>, pose: &CameraPose) -> Result<()> {
    fs::write(path, pose.to_camera_line())?;
    Ok(())
}
