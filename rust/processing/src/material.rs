// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Material parameter randomization.
//!
//! Only parameters are touched; the node graph itself is authored elsewhere
//! and never restructured here.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::uniform;

/// Role of a node in a material graph, with the parameters we randomize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    NoiseTexture {
        scale: f64,
    },
    PrincipledBsdf {
        base_color: [f64; 4],
        roughness: f64,
    },
    Math {
        operation: String,
        inputs: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialNode {
    pub label: String,
    pub kind: NodeKind,
}

impl MaterialNode {
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

/// Shader node graph attached to a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub nodes: Vec<MaterialNode>,
}

impl Material {
    /// Layered cast-iron look: three noise octaves feeding a multiplier and
    /// a principled BSDF
    pub fn cast_iron() -> Self {
        Self {
            name: "CastIron".to_string(),
            nodes: vec![
                MaterialNode::new("Noise Texture", NodeKind::NoiseTexture { scale: 20.0 }),
                MaterialNode::new("Noise Texture.001", NodeKind::NoiseTexture { scale: 8.0 }),
                MaterialNode::new("Noise Texture.002", NodeKind::NoiseTexture { scale: 0.2 }),
                MaterialNode::new(
                    "Math",
                    NodeKind::Math {
                        operation: "MULTIPLY".to_string(),
                        inputs: vec![0.5, 7.5],
                    },
                ),
                MaterialNode::new(
                    "Principled BSDF",
                    NodeKind::PrincipledBsdf {
                        base_color: [0.3, 0.3, 0.3, 1.0],
                        roughness: 0.1,
                    },
                ),
            ],
        }
    }

    pub fn node(&self, label: &str) -> Option<&MaterialNode> {
        self.nodes.iter().find(|n| n.label == label)
    }
}

/// Sampling ranges for [`randomize_material`]. All ranges are half-open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRanges {
    /// `(node label, min, max)` for each noise texture node
    pub noise_scales: Vec<(String, f64, f64)>,
    pub roughness: (f64, f64),
    pub multiplier: (f64, f64),
}

impl Default for MaterialRanges {
    fn default() -> Self {
        Self {
            noise_scales: vec![
                ("Noise Texture".to_string(), 0.8 * 20.0, 1.2 * 20.0),
                ("Noise Texture.001".to_string(), 0.8 * 8.0, 1.2 * 8.0),
                ("Noise Texture.002".to_string(), 0.8 * 0.2, 1.2 * 0.2),
            ],
            roughness: (0.05, 0.15),
            multiplier: (5.0, 10.0),
        }
    }
}

impl MaterialRanges {
    fn noise_scale(&self, label: &str) -> Option<(f64, f64)> {
        self.noise_scales
            .iter()
            .find(|(l, _, _)| l == label)
            .map(|&(_, min, max)| (min, max))
    }
}

/// Redraw the randomizable parameters of every node in `material`.
///
/// Noise nodes are matched to their range by label, so node order in the
/// graph does not matter. A noise node without a configured range, or a
/// math node without a second input, is an error and leaves later nodes
/// untouched.
pub fn randomize_material<R: Rng + ?Sized>(
    material: &mut Material,
    ranges: &MaterialRanges,
    rng: &mut R,
) -> Result<()> {
    for node in material.nodes.iter_mut() {
        match &mut node.kind {
            NodeKind::NoiseTexture { scale } => {
                let (min, max) = ranges
                    .noise_scale(&node.label)
                    .ok_or_else(|| Error::not_found("Noise scale range", node.label.clone()))?;
                *scale = uniform(rng, min, max);
            }
            NodeKind::PrincipledBsdf {
                base_color,
                roughness,
            } => {
                *base_color = [rng.random(), rng.random(), rng.random(), 1.0];
                *roughness = uniform(rng, ranges.roughness.0, ranges.roughness.1);
            }
            NodeKind::Math { inputs, .. } => {
                let slot = inputs.get_mut(1).ok_or_else(|| {
                    Error::Material(format!(
                        "math node '{}' has no multiplier input",
                        node.label
                    ))
                })?;
                *slot = uniform(rng, ranges.multiplier.0, ranges.multiplier.1);
            }
        }
    }
    debug!(material = %material.name, nodes = material.nodes.len(), "Randomized material");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn test_values_land_in_ranges() {
        let ranges = MaterialRanges::default();
        let mut rng = seeded_rng(5);
        for _ in 0..100 {
            let mut material = Material::cast_iron();
            randomize_material(&mut material, &ranges, &mut rng).unwrap();

            for node in &material.nodes {
                match &node.kind {
                    NodeKind::NoiseTexture { scale } => {
                        let (min, max) = ranges.noise_scale(&node.label).unwrap();
                        assert!(*scale >= min && *scale < max, "{} = {}", node.label, scale);
                    }
                    NodeKind::PrincipledBsdf {
                        base_color,
                        roughness,
                    } => {
                        assert!(base_color[..3].iter().all(|c| (0.0..1.0).contains(c)));
                        assert_eq!(base_color[3], 1.0);
                        assert!((0.05..0.15).contains(roughness));
                    }
                    NodeKind::Math { inputs, .. } => {
                        assert_eq!(inputs[0], 0.5);
                        assert!((5.0..10.0).contains(&inputs[1]));
                    }
                }
            }
        }
    }

    #[test]
    fn test_noise_ranges_follow_labels_not_order() {
        let mut material = Material::cast_iron();
        material.nodes.reverse();
        randomize_material(&mut material, &MaterialRanges::default(), &mut seeded_rng(1)).unwrap();

        match material.node("Noise Texture.002").map(|n| &n.kind) {
            Some(NodeKind::NoiseTexture { scale }) => assert!(*scale < 0.24),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_unknown_noise_node_is_rejected() {
        let mut material = Material::cast_iron();
        material
            .nodes
            .push(MaterialNode::new("Noise Texture.003", NodeKind::NoiseTexture { scale: 1.0 }));
        let err = randomize_material(&mut material, &MaterialRanges::default(), &mut seeded_rng(1))
            .unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { .. }));
    }

    #[test]
    fn test_short_math_node_is_rejected() {
        let mut material = Material {
            name: "Broken".into(),
            nodes: vec![MaterialNode::new(
                "Math",
                NodeKind::Math {
                    operation: "MULTIPLY".into(),
                    inputs: vec![1.0],
                },
            )],
        };
        let err = randomize_material(&mut material, &MaterialRanges::default(), &mut seeded_rng(1))
            .unwrap_err();
        assert!(matches!(err, Error::Material(_)));
    }
}
