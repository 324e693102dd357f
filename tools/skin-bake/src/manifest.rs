//! bake.toml manifest parsing
//!
//! ```toml
//! [bake]
//! input = "models/hero.gltf"
//! output = "build/hero.skbake"
//! name = "hero"          # optional, defaults to the input file stem
//! lod_count = 3          # optional, 1-8, default 1
//! sample_step = 0.05     # optional forced timestep in seconds
//! clips = ["idle", "walk"] # optional, default every clip
//!
//! [[bones]]
//! name = "finger_01"
//! lod = 0                # animated at LOD 0 only
//! ```

use anyhow::{Context, Result};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bake::BakeJob;
use crate::hierarchy::MAX_LOD_LEVELS;
use crate::model::BakeSettings;

/// bake.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct BakeManifest {
    pub bake: BakeSection,
    #[serde(default)]
    pub bones: Vec<BoneOverride>,
}

/// Bake inputs and settings
#[derive(Debug, Deserialize)]
pub struct BakeSection {
    /// glTF/GLB source, relative to the manifest
    pub input: String,
    /// Artifact destination, relative to the manifest
    pub output: String,
    /// Base name for generated meshes
    #[serde(default)]
    pub name: Option<String>,
    /// Number of LOD levels (1-8).
    /// Default: 1
    #[serde(default = "default_lod_count")]
    pub lod_count: u8,
    /// Forced sampling timestep in seconds
    #[serde(default)]
    pub sample_step: Option<f32>,
    /// Clips to bake. Empty bakes every clip.
    #[serde(default)]
    pub clips: Vec<String>,
}

fn default_lod_count() -> u8 {
    1
}

/// Per-bone LOD support override
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoneOverride {
    pub name: String,
    /// Highest LOD level at which the bone stays animated
    pub lod: u8,
}

impl BakeManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse bake.toml")
    }

    /// Validate manifest fields
    pub fn validate(&self) -> Result<()> {
        if self.bake.lod_count == 0 || self.bake.lod_count > MAX_LOD_LEVELS {
            anyhow::bail!(
                "Invalid lod_count {} in bake.toml (must be 1-{})",
                self.bake.lod_count,
                MAX_LOD_LEVELS
            );
        }

        if let Some(step) = self.bake.sample_step {
            if !step.is_finite() || step <= 0.0 {
                anyhow::bail!(
                    "Invalid sample_step {} in bake.toml (must be a positive number of seconds)",
                    step
                );
            }
        }

        let mut seen = HashSet::new();
        for bone in &self.bones {
            if !seen.insert(bone.name.as_str()) {
                anyhow::bail!("Bone '{}' is listed more than once in bake.toml", bone.name);
            }
            if bone.lod >= self.bake.lod_count {
                anyhow::bail!(
                    "Bone '{}' has lod {} but lod_count is {}",
                    bone.name,
                    bone.lod,
                    self.bake.lod_count
                );
            }
        }

        let mut seen = HashSet::new();
        for clip in &self.bake.clips {
            if !seen.insert(clip.as_str()) {
                anyhow::bail!("Clip '{}' is listed more than once in bake.toml", clip);
            }
        }

        Ok(())
    }

    pub fn settings(&self) -> BakeSettings {
        BakeSettings {
            sample_step: self.bake.sample_step,
            lod_count: self.bake.lod_count,
        }
    }

    /// Build a job with paths resolved against `base_dir`
    ///
    /// `output_override` replaces the manifest output as given (not re-based).
    pub fn job(&self, base_dir: &Path, output_override: Option<PathBuf>) -> BakeJob {
        BakeJob {
            input: base_dir.join(&self.bake.input),
            output: output_override.unwrap_or_else(|| base_dir.join(&self.bake.output)),
            name: self.bake.name.clone(),
            settings: self.settings(),
            bone_lods: self.bones.clone(),
            clips: self.bake.clips.clone(),
        }
    }
}
