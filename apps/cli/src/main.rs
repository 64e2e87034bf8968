// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! tdg - synthetic defect training-data generator.
//!
//! # Commands
//!
//! - `tdg generate` - carve defects into the template scene and render the
//!   inspection path, once per model
//! - `tdg sort` - bucket rendered images into `defect` and `faultfree` by
//!   defect-pixel coverage
//!
//! Both commands work in the current directory unless `--workdir` is given.
//! Tunables come from `TDG_*` environment variables (see `config.rs`);
//! logging is controlled with `RUST_LOG`.

mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Synthetic defect training-data generator
#[derive(Parser)]
#[command(name = "tdg")]
#[command(about = "Generate and sort synthetic defect datasets")]
#[command(version)]
struct Cli {
    /// Working directory holding the template scene and inspection path
    #[arg(short = 'C', long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate defect models and render every pose of the inspection path
    Generate {
        /// Number of defect models (overrides TDG_MODELS)
        #[arg(long)]
        models: Option<usize>,

        /// Random seed (overrides TDG_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Sort rendered images by defect coverage
    Sort {
        /// Minimum defect pixels for the defect bucket (overrides TDG_DEFECT_THRESHOLD)
        #[arg(long)]
        threshold: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    let workdir = match cli.workdir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Generate { models, seed } => {
            if let Some(models) = models {
                config.models = models;
            }
            let seed = seed.or(config.seed).unwrap_or_else(rand::random);
            tracing::info!(seed, workdir = %workdir.display(), "Using seed");

            let mut rng = tdg_processing::seeded_rng(seed);
            let summary =
                pipeline::run_generation(&config, &workdir, &config.renderer(), &mut rng)?;
            println!(
                "Generated {} images ({} defects) in {}",
                summary.images,
                summary.fragments,
                summary.dataset_dir.display()
            );
        }
        Commands::Sort { threshold } => {
            if let Some(threshold) = threshold {
                config.defect_threshold = threshold;
            }
            let report =
                tdg_dataset::sort_dataset(&workdir, &config.classifier(), chrono::Local::now())
                    .context("Sorting dataset failed")?;
            println!("{:?}", report.as_array());
        }
    }

    Ok(())
}
