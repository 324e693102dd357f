//! File-to-file baking
//!
//! Glue between the manifest/CLI and the pipeline: load a glTF file, apply
//! overrides, bake, save.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bake_common::BakedAsset;

use crate::import::load_gltf;
use crate::manifest::BoneOverride;
use crate::model::{BakeInput, BakeSettings};
use crate::session::BakeSession;
use crate::store::FileStore;

/// One glTF file to bake into one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct BakeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Base mesh name, defaults to the input file stem
    pub name: Option<String>,
    pub settings: BakeSettings,
    pub bone_lods: Vec<BoneOverride>,
    /// Clips to keep. Empty keeps every clip.
    pub clips: Vec<String>,
}

impl BakeJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            name: None,
            settings: BakeSettings::default(),
            bone_lods: Vec::new(),
            clips: Vec::new(),
        }
    }
}

/// Set per-bone LOD support from overrides
pub fn apply_bone_overrides(input: &mut BakeInput, overrides: &[BoneOverride]) -> Result<()> {
    for entry in overrides {
        let bone = input
            .bones
            .iter_mut()
            .find(|b| b.name == entry.name)
            .with_context(|| format!("LOD override for unknown bone '{}'", entry.name))?;
        bone.lod_support = Some(entry.lod);
    }
    Ok(())
}

/// Keep only the named clips, in input order
pub fn select_clips(input: &mut BakeInput, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    if let Some(missing) = names
        .iter()
        .find(|n| !input.clips.iter().any(|c| &c.name == *n))
    {
        let available: Vec<_> = input.clips.iter().map(|c| c.name.as_str()).collect();
        anyhow::bail!(
            "Clip '{}' not found. Available clips: {:?}",
            missing,
            available
        );
    }
    input.clips.retain(|c| names.contains(&c.name));
    Ok(())
}

/// Load, bake and save one job
pub fn run_job(job: &BakeJob) -> Result<BakedAsset> {
    let (mut input, mut sampler) = load_gltf(&job.input)?;
    if let Some(name) = &job.name {
        input.name = name.clone();
    }
    apply_bone_overrides(&mut input, &job.bone_lods)?;
    select_clips(&mut input, &job.clips)?;

    let mut session = BakeSession::new(job.settings);
    let asset = session
        .bake_and_save(&input, &mut sampler, &FileStore, &job.output)
        .with_context(|| format!("Failed to bake {}", job.input.display()))?;

    tracing::info!(
        "Baked {} -> {}: {} bones, {} tracks, {} animations, {} meshes",
        job.input.display(),
        job.output.display(),
        asset.bones.len(),
        asset.tracks.len(),
        asset.animations.len(),
        asset.meshes.len()
    );
    Ok(asset)
}
