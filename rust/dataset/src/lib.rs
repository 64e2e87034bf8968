// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # TDG Dataset
//!
//! Sorts a rendered dataset into `defect` and `faultfree` buckets by counting
//! defect pixels in each image's segmentation map.
//!
//! ```no_run
//! use tdg_dataset::{sort_dataset, ClassifierOptions};
//!
//! let report = sort_dataset("datasets", &ClassifierOptions::default(), chrono::Local::now())?;
//! println!("{:?}", report.as_array());
//! # Ok::<(), tdg_dataset::Error>(())
//! ```

pub mod classify;
pub mod error;
pub mod label;
pub mod sort;

pub use classify::{classify, Classification, ClassifierOptions};
pub use error::{Error, Result};
pub use label::{count_label_file, ClassCounts, LabelMap};
pub use sort::{
    create_output_folders, discover_label_files, label_bundle, sort_dataset, OutputFolders,
    SortReport,
};
