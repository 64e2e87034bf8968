// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Defect synthesis pipeline shared by the `tdg` command-line tool.
//!
//! - [`scene`]: part, tool and fragment objects with validated handles
//! - [`sites`] / [`defect`] / [`generate`]: defect placement and carving
//! - [`material`]: shader parameter randomization
//! - [`camera`], [`light`], [`render_config`], [`renderer`]: per-image render setup
//!
//! Every randomized call takes an explicit `Rng`, so a run is reproducible
//! from its seed (see [`seeded_rng`]).

pub mod camera;
pub mod defect;
pub mod error;
pub mod generate;
pub mod light;
pub mod material;
pub mod render_config;
pub mod renderer;
pub mod scene;
pub mod sites;

pub use camera::{jitter_poses, PoseJitter};
pub use defect::{DefectConfig, DefectParams, DefectRecord, DefectShaper, DefectSite};
pub use error::{Error, Result};
pub use generate::{generate_defects, GenerationConfig, GenerationReport, BLOWHOLE_CATEGORY_ID};
pub use light::{draw_light_energy, light_location, LightSettings};
pub use material::{randomize_material, Material, MaterialNode, MaterialRanges, NodeKind};
pub use render_config::{RenderConfig, COLORS_SUFFIX, SEGMAP_SUFFIX};
pub use renderer::{RenderJob, RendererStage};
pub use scene::{Fragment, GeometryOp, Part, PartHandle, Scene, Tool, ToolHandle, ToolModifier};
pub use sites::{select_defect_sites, SiteSpacing};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Deterministic generator used throughout the pipeline
pub fn seeded_rng(seed: u64) -> Pcg64 {
    Pcg64::seed_from_u64(seed)
}

/// Uniform draw from `[min, max)`; collapses to `min` for an empty range
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}
