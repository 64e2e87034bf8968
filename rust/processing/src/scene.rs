// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene state shared between generation stages.
//!
//! Objects are looked up by name once, when a handle is created; afterwards
//! the pipeline works with handles so a missing object fails at resolution
//! time with a named error instead of deep inside a stage.

use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tdg_geometry::{solidify, Mesh, NoiseDisplace};

use crate::error::{Error, Result};
use crate::material::Material;

/// Operation recorded in a part's geometry history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryOp {
    /// A tool was carved out of the part at the given vertex site
    BooleanDifference { tool: String, site: usize },
}

/// The inspected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    pub mesh: Mesh,
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default)]
    pub history: Vec<GeometryOp>,
}

impl Part {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            material: None,
            history: Vec::new(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }
}

/// Modifier on a tool's stack, applied in order on evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ToolModifier {
    Displace(NoiseDisplace),
    Solidify { thickness: f64 },
}

/// Transient volume used to shape and carve one defect at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    /// Pristine tool geometry in local coordinates
    pub template: Mesh,
    pub location: [f64; 3],
    #[serde(default)]
    pub modifiers: Vec<ToolModifier>,
}

impl Tool {
    pub fn new(name: impl Into<String>, template: Mesh) -> Self {
        Self {
            name: name.into(),
            template,
            location: [0.0; 3],
            modifiers: Vec::new(),
        }
    }

    pub fn add_modifier(&mut self, modifier: ToolModifier) {
        self.modifiers.push(modifier);
    }

    /// Add a solidify modifier, or retarget the existing one
    pub fn make_solid(&mut self, thickness: f64) {
        for modifier in self.modifiers.iter_mut() {
            if let ToolModifier::Solidify { thickness: current } = modifier {
                *current = thickness;
                return;
            }
        }
        self.modifiers.push(ToolModifier::Solidify { thickness });
    }

    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
    }

    /// Template with the modifier stack applied, moved to `location`
    pub fn evaluated_mesh(&self) -> Mesh {
        let mut mesh = self.template.clone();
        for modifier in &self.modifiers {
            match modifier {
                ToolModifier::Displace(displace) => displace.apply(&mut mesh),
                ToolModifier::Solidify { thickness } => mesh = solidify(&mesh, *thickness),
            }
        }
        let [x, y, z] = self.location;
        mesh.translate(Vector3::new(x, y, z));
        mesh
    }
}

/// Isolated defect geometry, labelled for segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub name: String,
    pub mesh: Mesh,
    pub category_id: i32,
}

/// Handle to a part resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartHandle(usize);

/// Handle to a tool resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolHandle(usize);

/// Everything the renderer sees: parts, tools and generated fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_handle(&self, name: &str) -> Result<PartHandle> {
        self.parts
            .iter()
            .position(|p| p.name == name)
            .map(PartHandle)
            .ok_or_else(|| Error::not_found("Part", name))
    }

    pub fn tool_handle(&self, name: &str) -> Result<ToolHandle> {
        self.tools
            .iter()
            .position(|t| t.name == name)
            .map(ToolHandle)
            .ok_or_else(|| Error::not_found("Tool", name))
    }

    pub fn part(&self, handle: PartHandle) -> &Part {
        &self.parts[handle.0]
    }

    pub fn part_mut(&mut self, handle: PartHandle) -> &mut Part {
        &mut self.parts[handle.0]
    }

    pub fn tool(&self, handle: ToolHandle) -> &Tool {
        &self.tools[handle.0]
    }

    /// Borrow a part and a tool mutably at the same time
    pub fn part_and_tool_mut(&mut self, part: PartHandle, tool: ToolHandle) -> (&mut Part, &mut Tool) {
        (&mut self.parts[part.0], &mut self.tools[tool.0])
    }

    /// Remove a tool from the scene. Other tool handles are invalidated.
    pub fn remove_tool(&mut self, handle: ToolHandle) -> Tool {
        self.tools.remove(handle.0)
    }

    /// Load a scene state file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write the scene state file, replacing any previous content
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_vec(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tdg_geometry::{box_mesh, uv_sphere};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.parts.push(Part::new(
            "Casing",
            box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
        ));
        scene.tools.push(Tool::new("Sphere", uv_sphere(0.2, 8, 4).unwrap()));
        scene
    }

    #[test]
    fn test_handles_resolve_by_name() {
        let scene = scene();
        let part = scene.part_handle("Casing").unwrap();
        assert_eq!(scene.part(part).name, "Casing");

        match scene.tool_handle("Cube") {
            Err(Error::EntityNotFound { kind, name }) => {
                assert_eq!(kind, "Tool");
                assert_eq!(name, "Cube");
            }
            other => panic!("Expected EntityNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_make_solid_retargets_existing_modifier() {
        let mut tool = Tool::new("Sphere", uv_sphere(0.2, 8, 4).unwrap());
        tool.make_solid(0.01);
        tool.make_solid(0.05);
        assert_eq!(tool.modifiers, vec![ToolModifier::Solidify { thickness: 0.05 }]);

        tool.clear_modifiers();
        assert!(tool.modifiers.is_empty());
    }

    #[test]
    fn test_evaluated_mesh_is_translated() {
        let mut tool = Tool::new("Sphere", uv_sphere(1.0, 8, 4).unwrap());
        tool.location = [10.0, 0.0, -2.0];
        let (min, max) = tool.evaluated_mesh().bounds();
        assert!((min.x - 9.0).abs() < 1e-3 && (max.x - 11.0).abs() < 1e-3);
        assert!((min.z + 3.0).abs() < 1e-3 && (max.z + 1.0).abs() < 1e-3);
        // template itself is untouched
        assert_eq!(tool.template.bounds().1.x, 1.0);
    }

    #[test]
    fn test_save_and_load_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut original = scene();
        original.fragments.push(Fragment {
            name: "Casing.defect.000".into(),
            mesh: Mesh::new(),
            category_id: 2,
        });

        original.save(&path).unwrap();
        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
