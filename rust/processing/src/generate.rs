// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One generation pass: select sites on the part, carve a defect at each,
//! drop the tool and smooth the results.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tdg_geometry::calculate_smooth_normals;
use tracing::info;

use crate::defect::{DefectConfig, DefectRecord, DefectShaper, DefectSite};
use crate::error::Result;
use crate::scene::Scene;
use crate::sites::SiteSpacing;

/// Category id written on every fragment ("blowhole")
pub const BLOWHOLE_CATEGORY_ID: i32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub part_name: String,
    pub tool_name: String,
    pub spacing: SiteSpacing,
    pub defect: DefectConfig,
    pub category_id: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            part_name: "Turbosupercharger".to_string(),
            tool_name: "Sphere".to_string(),
            spacing: SiteSpacing::default(),
            defect: DefectConfig::default(),
            category_id: BLOWHOLE_CATEGORY_ID,
        }
    }
}

/// Summary of a generation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Selected vertex indices, in carve order
    pub sites: Vec<usize>,
    pub defects: Vec<DefectRecord>,
}

impl GenerationReport {
    pub fn fragment_count(&self) -> usize {
        self.defects.len()
    }
}

/// Run a full generation pass on `scene`.
///
/// Site positions and normals are read from the part before the first
/// carve. The tool is removed from the scene afterwards, even when no site
/// was selected. Carved meshes get smooth normals; an untouched part is
/// left exactly as loaded.
pub fn generate_defects<R: Rng + ?Sized>(
    scene: &mut Scene,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<GenerationReport> {
    config.spacing.validate()?;
    let part = scene.part_handle(&config.part_name)?;
    let tool = scene.tool_handle(&config.tool_name)?;

    let mesh = &scene.part(part).mesh;
    let sites = config.spacing.select(mesh.vertex_count(), rng);
    let targets = sites
        .iter()
        .map(|&index| -> Result<DefectSite> {
            Ok(DefectSite {
                index,
                point: mesh.surface_point(index)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        part = %config.part_name,
        vertices = mesh.vertex_count(),
        sites = sites.len(),
        "Selected defect sites"
    );

    let history_before = scene.part(part).history.len();
    let first_fragment = scene.fragments.len();

    let shaper = DefectShaper::new(config.defect);
    let mut defects = Vec::with_capacity(targets.len());
    for site in targets {
        defects.push(shaper.create_defect(scene, part, tool, site, config.category_id, rng)?);
    }

    scene.remove_tool(tool);

    if scene.part(part).history.len() > history_before {
        calculate_smooth_normals(&mut scene.part_mut(part).mesh);
    }
    for fragment in &mut scene.fragments[first_fragment..] {
        calculate_smooth_normals(&mut fragment.mesh);
    }

    info!(
        part = %config.part_name,
        fragments = defects.len(),
        "Defects were created"
    );

    Ok(GenerationReport { sites, defects })
}
