// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Defect shaping: place the tool, roughen it, carve, isolate the fragment.
//!
//! The same displaced tool is used for the carve and for the fragment, so
//! the pocket in the part and the fragment surface match. The solidify
//! modifier is only added between the two booleans.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tdg_geometry::{BooleanProcessor, NoiseDisplace, SurfacePoint};
use tracing::debug;

use crate::error::Result;
use crate::scene::{Fragment, GeometryOp, PartHandle, Scene, ToolHandle, ToolModifier};
use crate::uniform;

/// Sampling ranges for a single defect. Ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefectConfig {
    /// How far the tool centre sinks below the surface, along the normal
    pub offset: (f64, f64),
    pub strength: (f64, f64),
    /// Octave range; the drawn value is floored
    pub depth: (f64, f64),
    pub scale: (f64, f64),
    pub solidify_thickness: f64,
    pub noise_seed: u32,
}

impl Default for DefectConfig {
    fn default() -> Self {
        Self {
            offset: (0.0, 0.3),
            strength: (-0.8, 0.8),
            depth: (0.0, 20.0),
            scale: (2.0, 10.0),
            solidify_thickness: 0.01,
            noise_seed: 0,
        }
    }
}

/// Random draws used for one defect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefectParams {
    pub offset: f64,
    pub strength: f64,
    pub depth: u32,
    pub scale: f64,
}

impl DefectParams {
    /// Draw in a fixed order: offset, strength, depth, scale
    pub fn draw<R: Rng + ?Sized>(config: &DefectConfig, rng: &mut R) -> Self {
        let offset = uniform(rng, config.offset.0, config.offset.1);
        let strength = uniform(rng, config.strength.0, config.strength.1);
        let depth = uniform(rng, config.depth.0, config.depth.1).floor().max(0.0) as u32;
        let scale = uniform(rng, config.scale.0, config.scale.1);
        Self {
            offset,
            strength,
            depth,
            scale,
        }
    }
}

/// A vertex chosen to host a defect, captured before any carving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefectSite {
    pub index: usize,
    pub point: SurfacePoint,
}

/// Outcome of shaping one defect
#[derive(Debug, Clone, PartialEq)]
pub struct DefectRecord {
    pub site: usize,
    pub params: DefectParams,
    /// Index of the new fragment in `Scene::fragments`
    pub fragment: usize,
}

/// Carves defects into a part with a reusable tool
#[derive(Debug, Clone, Default)]
pub struct DefectShaper {
    pub config: DefectConfig,
    processor: BooleanProcessor,
}

impl DefectShaper {
    pub fn new(config: DefectConfig) -> Self {
        Self {
            config,
            processor: BooleanProcessor::new(),
        }
    }

    /// Shape and carve one defect at `site`.
    ///
    /// On error the part may already be carved; nothing is rolled back.
    pub fn create_defect<R: Rng + ?Sized>(
        &self,
        scene: &mut Scene,
        part: PartHandle,
        tool: ToolHandle,
        site: DefectSite,
        category_id: i32,
        rng: &mut R,
    ) -> Result<DefectRecord> {
        let params = DefectParams::draw(&self.config, rng);
        let fragment_index = scene.fragments.len();
        let (part, tool) = scene.part_and_tool_mut(part, tool);

        let centre = site.point.position - site.point.normal * params.offset;
        tool.location = [centre.x, centre.y, centre.z];

        tool.add_modifier(ToolModifier::Displace(NoiseDisplace {
            strength: params.strength,
            depth: params.depth,
            scale: params.scale,
            seed: self.config.noise_seed,
        }));

        let mut fragment = Fragment {
            name: format!("{}.defect.{:03}", part.name, fragment_index),
            mesh: part.mesh.clone(),
            category_id,
        };

        let carving = tool.evaluated_mesh();
        part.mesh = self.processor.subtract_mesh(&part.mesh, &carving)?;
        part.history.push(GeometryOp::BooleanDifference {
            tool: tool.name.clone(),
            site: site.index,
        });

        tool.make_solid(self.config.solidify_thickness);
        fragment.mesh = self
            .processor
            .intersect_mesh(&fragment.mesh, &tool.evaluated_mesh())?;

        tool.clear_modifiers();

        debug!(
            site = site.index,
            offset = params.offset,
            strength = params.strength,
            depth = params.depth,
            scale = params.scale,
            triangles = fragment.mesh.triangle_count(),
            "Created defect"
        );

        scene.fragments.push(fragment);
        Ok(DefectRecord {
            site: site.index,
            params,
            fragment: fragment_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Part, Tool};
    use crate::seeded_rng;
    use tdg_geometry::{box_mesh, uv_sphere, Point3};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.parts.push(Part::new(
            "Casing",
            box_mesh(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)),
        ));
        scene.tools.push(Tool::new("Sphere", uv_sphere(0.4, 16, 8).unwrap()));
        scene
    }

    fn shape(seed: u64) -> (Scene, DefectRecord) {
        let mut scene = scene();
        let part = scene.part_handle("Casing").unwrap();
        let tool = scene.tool_handle("Sphere").unwrap();
        let point = scene.part(part).mesh.surface_point(6).unwrap();
        let record = DefectShaper::default()
            .create_defect(
                &mut scene,
                part,
                tool,
                DefectSite { index: 6, point },
                2,
                &mut seeded_rng(seed),
            )
            .unwrap();
        (scene, record)
    }

    #[test]
    fn test_params_stay_in_ranges() {
        let config = DefectConfig::default();
        let mut rng = seeded_rng(8);
        for _ in 0..500 {
            let p = DefectParams::draw(&config, &mut rng);
            assert!((0.0..0.3).contains(&p.offset));
            assert!((-0.8..0.8).contains(&p.strength));
            assert!(p.depth < 20);
            assert!((2.0..10.0).contains(&p.scale));
        }
    }

    #[test]
    fn test_same_seed_same_defect() {
        let (scene_a, a) = shape(42);
        let (scene_b, b) = shape(42);
        assert_eq!(a, b);
        assert_eq!(scene_a.fragments, scene_b.fragments);
        assert_eq!(scene_a.parts, scene_b.parts);
        assert_eq!(scene_a.fragments[0].category_id, 2);
    }

    #[test]
    fn test_carve_records_history_and_resets_tool() {
        let (scene, record) = shape(7);
        let part = &scene.parts[0];
        assert_eq!(
            part.history,
            vec![GeometryOp::BooleanDifference {
                tool: "Sphere".into(),
                site: 6
            }]
        );
        assert_eq!(record.fragment, 0);
        assert_eq!(scene.fragments[0].name, "Casing.defect.000");

        let tool = &scene.tools[0];
        assert!(tool.modifiers.is_empty());
        // the tool sits on the corner, pushed inward along the corner normal
        let inward = 1.0 - record.params.offset / 3f64.sqrt();
        for c in tool.location {
            assert!((c - inward).abs() < 1e-5, "{} vs {}", c, inward);
        }
    }

    #[test]
    fn test_carve_removes_material() {
        let (scene, _) = shape(3);
        let volume = scene.parts[0].mesh.signed_volume();
        assert!(volume < 8.0 - 1e-3, "volume {}", volume);
        // at most a whole, fully displaced tool can be removed
        assert!(volume > 8.0 - 4.0 / 3.0 * std::f64::consts::PI * 0.8f64.powi(3));
        assert!(!scene.fragments[0].mesh.is_empty());
    }
}
