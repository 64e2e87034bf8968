// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while sorting a dataset
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode label map {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported label map {path}: {reason}")]
    UnsupportedLabel { path: PathBuf, reason: String },

    #[error("Failed to walk dataset: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
