//! skin-bake - skinned animation baker
//!
//! Bakes rigged, animated glTF models into a single `.skbake` artifact:
//! canonical skeleton, deduplicated track pool, animation index and
//! per-LOD meshes with packed bone influences.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use bake_common::BAKED_ASSET_EXT;
use skin_bake::inspect::{AssetSummary, inspect_file};
use skin_bake::manifest::BakeManifest;
use skin_bake::{BakeJob, BakeSettings, run_job};

#[derive(Parser)]
#[command(name = "skin-bake")]
#[command(about = "Skinned animation baker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake from a manifest file
    Build {
        /// Path to bake.toml manifest
        #[arg(default_value = "bake.toml")]
        manifest: PathBuf,

        /// Output artifact (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a manifest without baking
    Check {
        /// Path to bake.toml manifest
        #[arg(default_value = "bake.toml")]
        manifest: PathBuf,
    },

    /// Bake a single glTF/GLB file
    Bake {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .skbake file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Forced sampling timestep in seconds
        #[arg(long)]
        step: Option<f32>,

        /// Number of LOD levels (1-8)
        #[arg(long, default_value_t = 1)]
        lods: u8,

        /// Base name for generated meshes (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a summary of a baked asset
    Inspect {
        /// Input .skbake file
        artifact: PathBuf,

        /// Print the summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn load_manifest(path: &Path) -> Result<BakeManifest> {
    let manifest = BakeManifest::load(path)?;
    manifest.validate()?;
    Ok(manifest)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building from {:?}", manifest);
            let config = load_manifest(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            run_job(&config.job(base_dir, output))?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            load_manifest(&manifest)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Bake {
            input,
            output,
            step,
            lods,
            name,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(BAKED_ASSET_EXT));
            tracing::info!("Baking {:?} -> {:?}", input, output);
            let job = BakeJob {
                name,
                settings: BakeSettings {
                    sample_step: step,
                    lod_count: lods,
                },
                ..BakeJob::new(input, output)
            };
            run_job(&job)?;
            tracing::info!("Done!");
        }

        Commands::Inspect { artifact, json } => {
            let summary: AssetSummary = inspect_file(&artifact)?;
            if json {
                let text = serde_json::to_string_pretty(&summary)
                    .context("Failed to serialize summary")?;
                println!("{text}");
            } else {
                tracing::info!("{:?}", artifact);
                summary.log();
            }
        }
    }

    Ok(())
}
