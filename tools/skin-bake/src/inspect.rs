//! Baked asset inspection

use std::path::Path;

use anyhow::{Context, Result};
use bake_common::{BakedAsset, read_baked_asset};
use hashbrown::HashSet;
use serde::Serialize;

/// Summary of one animation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationSummary {
    pub name: String,
    pub samples: usize,
    pub length: f32,
    /// Distinct pool tracks referenced by this animation
    pub unique_tracks: usize,
}

/// Summary of one mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub skin: u16,
    pub lod: u8,
    pub vertices: usize,
    pub triangles: usize,
}

/// Human- and machine-readable overview of a baked asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub bones: usize,
    pub lod_count: u8,
    /// Bones animated independently, per LOD level
    pub animated_bones_per_lod: Vec<usize>,
    pub tracks: usize,
    /// Transforms stored across the track pool
    pub pooled_samples: usize,
    /// Transforms a non-deduplicated layout would store
    pub raw_samples: usize,
    pub animations: Vec<AnimationSummary>,
    pub meshes: Vec<MeshSummary>,
}

impl AssetSummary {
    pub fn from_asset(asset: &BakedAsset) -> Self {
        let animated_bones_per_lod = (0..asset.lod_count)
            .map(|lod| asset.bones.iter().filter(|b| b.is_animated_at(lod)).count())
            .collect();

        let animations = asset
            .animations
            .iter()
            .map(|a| AnimationSummary {
                name: a.name.clone(),
                samples: a.sample_times.len(),
                length: a.length(),
                unique_tracks: a.track_indices.iter().collect::<HashSet<_>>().len(),
            })
            .collect();

        let meshes = asset
            .meshes
            .iter()
            .map(|m| MeshSummary {
                name: m.name.clone(),
                skin: m.skin_index,
                lod: m.lod,
                vertices: m.vertex_count(),
                triangles: m.indices.len() / 3,
            })
            .collect();

        Self {
            bones: asset.bones.len(),
            lod_count: asset.lod_count,
            animated_bones_per_lod,
            tracks: asset.tracks.len(),
            pooled_samples: asset.tracks.iter().map(|t| t.samples.len()).sum(),
            raw_samples: asset
                .animations
                .iter()
                .map(|a| a.sample_times.len() * asset.bones.len())
                .sum(),
            animations,
            meshes,
        }
    }

    /// Write the summary to the log
    pub fn log(&self) {
        tracing::info!(
            "{} bones, {} LOD levels (animated per LOD: {:?})",
            self.bones,
            self.lod_count,
            self.animated_bones_per_lod
        );
        tracing::info!(
            "{} pooled tracks, {} of {} samples stored",
            self.tracks,
            self.pooled_samples,
            self.raw_samples
        );
        for a in &self.animations {
            tracing::info!(
                "  animation '{}': {} samples, {:.2}s, {} unique tracks",
                a.name,
                a.samples,
                a.length,
                a.unique_tracks
            );
        }
        for m in &self.meshes {
            tracing::info!(
                "  mesh '{}': skin {}, LOD {}, {} vertices, {} triangles",
                m.name,
                m.skin,
                m.lod,
                m.vertices,
                m.triangles
            );
        }
    }
}

/// Read a baked asset from disk and summarize it
pub fn inspect_file(path: &Path) -> Result<AssetSummary> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let asset = read_baked_asset(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(AssetSummary::from_asset(&asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bake_common::{BakedAnimation, BakedBone, BakedTrack, BoneTransform};

    #[test]
    fn test_summary_counts() {
        let moved = BoneTransform {
            position: [1.0, 0.0, 0.0],
            ..BoneTransform::IDENTITY
        };
        let asset = BakedAsset {
            bones: vec![
                BakedBone {
                    name: "root".into(),
                    parent: None,
                    lod_mask: 0b11,
                },
                BakedBone {
                    name: "tail".into(),
                    parent: Some(0),
                    lod_mask: 0b01,
                },
            ],
            lod_count: 2,
            tracks: vec![
                BakedTrack::new(vec![BoneTransform::IDENTITY]),
                BakedTrack::new(vec![BoneTransform::IDENTITY, moved]),
            ],
            animations: vec![
                BakedAnimation {
                    name: "rest_pose".into(),
                    sample_times: vec![0.0],
                    track_indices: vec![0, 0],
                },
                BakedAnimation {
                    name: "wag".into(),
                    sample_times: vec![0.0, 0.5],
                    track_indices: vec![0, 1],
                },
            ],
            meshes: Vec::new(),
        };

        let summary = AssetSummary::from_asset(&asset);
        assert_eq!(summary.animated_bones_per_lod, vec![2, 1]);
        assert_eq!(summary.pooled_samples, 3);
        assert_eq!(summary.raw_samples, 6);
        assert_eq!(summary.animations[0].unique_tracks, 1);
        assert_eq!(summary.animations[1].unique_tracks, 2);
        assert_eq!(summary.animations[1].length, 0.5);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["tracks"], 2);
        assert_eq!(json["animations"][1]["name"], "wag");
    }
}
