// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use tdg_dataset::ClassifierOptions;
use tdg_processing::{
    DefectConfig, GenerationConfig, LightSettings, PoseJitter, RendererStage, SiteSpacing,
    SEGMAP_SUFFIX,
};

/// Run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Seed for every random draw; a fresh one is drawn when unset.
    pub seed: Option<u64>,
    /// Number of defect models generated per run.
    pub models: usize,
    /// Jittered variants per inspection-path pose.
    pub pose_variants: usize,
    /// Images rendered per pose, each with a new material draw.
    pub images_per_pose: usize,
    /// Nominal light energy.
    pub light_energy: u64,
    pub defects_per_part: usize,
    pub spacing_factor: f64,
    /// Minimum defect pixels for an image to count as defective.
    pub defect_threshold: u64,
    /// Renderer executable.
    pub renderer: String,
    /// Arguments placed before the job paths (whitespace separated).
    pub renderer_args: Vec<String>,
    pub render_timeout_secs: u64,
    pub render_retries: u32,
    /// Inspection path file, relative to the working directory.
    pub inspection_path: String,
    /// Template scene file, relative to the working directory.
    pub scene_template: String,
    pub part_name: String,
    pub tool_name: String,
    pub label_suffix: String,
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset or unparsable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            seed: lookup("TDG_SEED").and_then(|v| v.trim().parse().ok()),
            models: parse_or(lookup("TDG_MODELS"), 15),
            pose_variants: parse_or(lookup("TDG_POSE_VARIANTS"), 2),
            images_per_pose: parse_or(lookup("TDG_IMAGES_PER_POSE"), 2),
            light_energy: parse_or(lookup("TDG_LIGHT_ENERGY"), 140_000),
            defects_per_part: parse_or(lookup("TDG_DEFECTS_PER_PART"), 101),
            spacing_factor: parse_or(lookup("TDG_SPACING_FACTOR"), 1.3),
            defect_threshold: parse_or(lookup("TDG_DEFECT_THRESHOLD"), 50),
            renderer: lookup("TDG_RENDERER").unwrap_or_else(|| "python".into()),
            renderer_args: lookup("TDG_RENDERER_ARGS")
                .unwrap_or_else(|| "../run.py".into())
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
            render_timeout_secs: parse_or(lookup("TDG_RENDER_TIMEOUT_SECS"), 3600),
            render_retries: parse_or(lookup("TDG_RENDER_RETRIES"), 0),
            inspection_path: lookup("TDG_INSPECTION_PATH")
                .unwrap_or_else(|| "Inspektionspfad_links_blenderready.txt".into()),
            scene_template: lookup("TDG_SCENE_TEMPLATE")
                .unwrap_or_else(|| "defaultscene.json".into()),
            part_name: lookup("TDG_PART_NAME").unwrap_or_else(|| "Turbosupercharger".into()),
            tool_name: lookup("TDG_TOOL_NAME").unwrap_or_else(|| "Sphere".into()),
            label_suffix: lookup("TDG_LABEL_SUFFIX").unwrap_or_else(|| SEGMAP_SUFFIX.into()),
        }
    }

    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            part_name: self.part_name.clone(),
            tool_name: self.tool_name.clone(),
            spacing: SiteSpacing {
                defects_per_part: self.defects_per_part,
                spacing_factor: self.spacing_factor,
            },
            defect: DefectConfig::default(),
            ..GenerationConfig::default()
        }
    }

    pub fn jitter(&self) -> PoseJitter {
        PoseJitter {
            variants_per_pose: self.pose_variants,
            ..PoseJitter::default()
        }
    }

    pub fn light(&self) -> LightSettings {
        LightSettings {
            base_energy: self.light_energy,
            ..LightSettings::default()
        }
    }

    pub fn renderer(&self) -> RendererStage {
        RendererStage::new(&self.renderer)
            .with_args(self.renderer_args.iter().cloned())
            .with_timeout(Duration::from_secs(self.render_timeout_secs))
            .with_retries(self.render_retries)
    }

    pub fn classifier(&self) -> ClassifierOptions {
        ClassifierOptions {
            threshold: self.defect_threshold,
            label_suffix: self.label_suffix.clone(),
            ..ClassifierOptions::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.models, 15);
        assert_eq!(config.pose_variants, 2);
        assert_eq!(config.images_per_pose, 2);
        assert_eq!(config.light_energy, 140_000);
        assert_eq!(config.generation().spacing, SiteSpacing::default());
        assert_eq!(config.classifier(), ClassifierOptions::default());
        assert_eq!(config.renderer_args, vec!["../run.py"]);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("TDG_SEED", "42"),
            ("TDG_MODELS", "3"),
            ("TDG_SPACING_FACTOR", "2.5"),
            ("TDG_DEFECT_THRESHOLD", "not-a-number"),
            ("TDG_RENDERER_ARGS", "  run.py   --quiet "),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.models, 3);
        assert_eq!(config.spacing_factor, 2.5);
        assert_eq!(config.defect_threshold, 50);
        assert_eq!(config.renderer_args, vec!["run.py", "--quiet"]);
    }
}
