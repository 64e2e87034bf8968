// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dataset generation loop.
//!
//! For each model: carve defects into a fresh copy of the template scene,
//! then walk the jittered inspection path. Every pose gets its own camera
//! file, light placement and render config; every image gets a new material
//! draw and one renderer run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rand::Rng;
use tdg_core::{load_inspection_path, write_camera_file, CameraPose};
use tdg_processing::{
    draw_light_energy, generate_defects, jitter_poses, light_location, randomize_material,
    MaterialRanges, RenderConfig, RenderJob, RendererStage, Scene,
};
use tracing::{debug, info};

use crate::config::Config;

/// What a generation run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub dataset_dir: PathBuf,
    pub images: usize,
    pub fragments: usize,
}

/// Paths shared by every stage of one run
struct RunPaths {
    template: PathBuf,
    scene: PathBuf,
    config: PathBuf,
    camera: PathBuf,
    output_base: PathBuf,
}

impl RunPaths {
    fn new(workdir: &Path, dataset_dir: &Path, config: &Config) -> Self {
        Self {
            template: workdir.join(&config.scene_template),
            scene: workdir.join("scene.json"),
            config: dataset_dir.join("config.yaml"),
            camera: dataset_dir.join("cam_pos.txt"),
            output_base: dataset_dir.join("output"),
        }
    }

    fn output(&self, count: usize) -> PathBuf {
        let mut name = self.output_base.clone().into_os_string();
        name.push(count.to_string());
        PathBuf::from(name)
    }
}

/// Run the full generation loop in `workdir`.
pub fn run_generation<R: Rng + ?Sized>(
    config: &Config,
    workdir: &Path,
    renderer: &RendererStage,
    rng: &mut R,
) -> Result<GenerationSummary> {
    let generation = config.generation();
    generation.spacing.validate()?;

    let dataset_dir = workdir.join(format!(
        "dataset{}",
        Local::now().format(tdg_dataset::sort::TIMESTAMP_FORMAT)
    ));
    fs::create_dir(&dataset_dir)
        .with_context(|| format!("Failed to create {}", dataset_dir.display()))?;
    let paths = RunPaths::new(workdir, &dataset_dir, config);

    // the renderer expects a camera file to exist before the first pose
    write_camera_file(&paths.camera, &CameraPose::default())?;

    let inspection_path = workdir.join(&config.inspection_path);
    let base_poses = load_inspection_path(&inspection_path)
        .with_context(|| format!("Failed to load {}", inspection_path.display()))?;
    info!(
        poses = base_poses.len(),
        models = config.models,
        dataset = %dataset_dir.display(),
        "Starting dataset generation"
    );

    let jitter = config.jitter();
    let light = config.light();
    let ranges = MaterialRanges::default();

    let mut count = 0;
    let mut fragments = 0;
    for model in 0..config.models {
        let mut scene = Scene::load(&paths.template)
            .with_context(|| format!("Failed to load {}", paths.template.display()))?;
        let report = generate_defects(&mut scene, &generation, rng)
            .with_context(|| format!("Defect generation failed for model {}", model))?;
        fragments += report.fragment_count();
        scene.save(&paths.scene)?;
        info!(model, defects = report.fragment_count(), "Model ready");

        for pose in jitter_poses(&base_poses, &jitter, rng) {
            write_camera_file(&paths.camera, &pose)?;

            let location = light_location(&pose, light.offset);
            let energy = draw_light_energy(light.base_energy, rng);
            RenderConfig::base()
                .with_light(location, pose.rotation, energy)?
                .write(&paths.config)?;
            debug!(?location, energy, "Light placed");

            for _ in 0..config.images_per_pose {
                randomize_scene_material(&paths.scene, &config.part_name, &ranges, rng)?;

                let job = RenderJob {
                    config: paths.config.clone(),
                    camera: paths.camera.clone(),
                    scene: paths.scene.clone(),
                    output: paths.output(count),
                };
                renderer
                    .render(&job)
                    .with_context(|| format!("Rendering image {} failed", count))?;
                count += 1;
            }
        }
    }

    info!(images = count, fragments, "Dataset generation finished");
    Ok(GenerationSummary {
        dataset_dir,
        images: count,
        fragments,
    })
}

/// Redraw the part's material parameters in the saved scene
fn randomize_scene_material<R: Rng + ?Sized>(
    scene_path: &Path,
    part_name: &str,
    ranges: &MaterialRanges,
    rng: &mut R,
) -> Result<()> {
    let mut scene = Scene::load(scene_path)?;
    let part = scene.part_handle(part_name)?;
    let material = scene
        .part_mut(part)
        .material
        .as_mut()
        .with_context(|| format!("Part '{}' has no material", part_name))?;
    randomize_material(material, ranges, rng)?;
    scene.save(scene_path)?;
    Ok(())
}
