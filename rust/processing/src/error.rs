// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the defect synthesis pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} '{name}' not found")]
    EntityNotFound { kind: &'static str, name: String },

    #[error("Geometry error: {0}")]
    Geometry(#[from] tdg_geometry::Error),

    #[error("Core error: {0}")]
    Core(#[from] tdg_core::Error),

    #[error("Spacing factor must be finite and at least 1, got {0}")]
    InvalidSpacing(f64),

    #[error("Material graph error: {0}")]
    Material(String),

    #[error("Invalid render config: {0}")]
    RenderConfig(String),

    #[error("Render failed after {attempts} attempt(s): {message}")]
    Render { attempts: u32, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::EntityNotFound {
            kind,
            name: name.into(),
        }
    }
}
