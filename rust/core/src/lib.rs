// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # TDG Core
//!
//! Value types shared by the defect training-data generator and the strict
//! parser for inspection-path files, built with [nom](https://docs.rs/nom).
//!
//! ## Inspection path format
//!
//! One record per line, written as a dict literal with the keys `X`, `Y`,
//! `Z` (camera location) and `A`, `B`, `C` (Euler rotation in radians):
//!
//! ```text
//! {'X': 0.12, 'Y': -3.5, 'Z': 1.0, 'A': 1.5708, 'B': 0.0, 'C': 3.1416}
//! ```
//!
//! ```rust
//! use tdg_core::parse_inspection_path;
//!
//! let poses = parse_inspection_path("{'X': 1, 'Y': 2, 'Z': 3, 'A': 0, 'B': 0, 'C': 0.5}\n").unwrap();
//! assert_eq!(poses[0].location, [1.0, 2.0, 3.0]);
//! assert_eq!(poses[0].to_camera_line(), "1 2 3 0 0 0.5");
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for [`CameraPose`]

pub mod error;
pub mod parser;
pub mod pose;

pub use error::{Error, Result};
pub use parser::parse_pose_record;
pub use pose::{load_inspection_path, parse_inspection_path, write_camera_file, CameraPose};
