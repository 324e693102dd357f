//! In-memory representation of a baked asset

use bytemuck::{Pod, Zeroable};

use super::header::BakedAssetHeader;
use crate::packing::PackedInfluence;

/// Parent index stored for root bones
pub const NO_PARENT: u16 = u16::MAX;

/// Size of one BoneTransform in bytes (40)
pub const BONE_TRANSFORM_SIZE: usize = 40;

/// Local bone transform (40 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoneTransform {
    /// Quaternion rotation [x, y, z, w]
    pub rotation: [f32; 4],
    /// Translation position
    pub position: [f32; 3],
    /// Non-uniform scale [x, y, z]
    pub scale: [f32; 3],
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        rotation: [0.0, 0.0, 0.0, 1.0],
        position: [0.0, 0.0, 0.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Size in bytes (40)
    pub const SIZE: usize = BONE_TRANSFORM_SIZE;

    /// All ten components in storage order (rotation, position, scale)
    pub fn components(&self) -> [f32; 10] {
        let r = self.rotation;
        let p = self.position;
        let s = self.scale;
        [r[0], r[1], r[2], r[3], p[0], p[1], p[2], s[0], s[1], s[2]]
    }

    /// Component-wise comparison with a relative tolerance
    ///
    /// Components are equal when `|a - b| <= tolerance * max(1, |a|, |b|)`.
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.components()
            .iter()
            .zip(other.components().iter())
            .all(|(&a, &b)| (a - b).abs() <= tolerance * 1f32.max(a.abs()).max(b.abs()))
    }

    /// Write to raw bytes (40 bytes)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        for (i, f) in self.components().iter().enumerate() {
            bytes[i * 4..(i + 1) * 4].copy_from_slice(&f.to_le_bytes());
        }
        bytes
    }

    /// Parse from raw bytes (40 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let f = |i: usize| {
            f32::from_le_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]])
        };
        Some(Self {
            rotation: [f(0), f(1), f(2), f(3)],
            position: [f(4), f(5), f(6)],
            scale: [f(7), f(8), f(9)],
        })
    }
}

/// One bone of the canonical skeleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedBone {
    /// Unique bone name
    pub name: String,
    /// Canonical parent index (always lower than this bone's index)
    pub parent: Option<u16>,
    /// Bit L set when the bone is animated independently at LOD L
    pub lod_mask: u8,
}

impl BakedBone {
    /// Whether the bone keeps its own animation at the given LOD level
    pub fn is_animated_at(&self, lod: u8) -> bool {
        lod < 8 && self.lod_mask & (1 << lod) != 0
    }
}

/// One pooled track: the samples of a single bone over a single animation
///
/// A one-sample track is constant over the whole animation.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedTrack {
    pub samples: Vec<BoneTransform>,
}

impl BakedTrack {
    pub fn new(samples: Vec<BoneTransform>) -> Self {
        Self { samples }
    }

    /// Time-aligned, component-wise comparison
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(&other.samples)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// Whether every sample matches the first one
    pub fn is_constant(&self, tolerance: f32) -> bool {
        match self.samples.split_first() {
            Some((first, rest)) => rest.iter().all(|s| s.approx_eq(first, tolerance)),
            None => true,
        }
    }

    /// Transform at a sample index, holding the last sample for constant tracks
    pub fn sample(&self, index: usize) -> Option<&BoneTransform> {
        self.samples
            .get(index)
            .or_else(|| (self.samples.len() == 1).then(|| &self.samples[0]))
    }
}

/// One animation of the baked asset
#[derive(Debug, Clone, PartialEq)]
pub struct BakedAnimation {
    /// Unique animation name
    pub name: String,
    /// Resolved, strictly increasing sample times in seconds
    pub sample_times: Vec<f32>,
    /// Track pool index per canonical bone
    pub track_indices: Vec<u32>,
}

impl BakedAnimation {
    /// Sampled length in seconds (0 for single-sample animations)
    pub fn length(&self) -> f32 {
        match (self.sample_times.first(), self.sample_times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// One per-skin, per-LOD mesh of the baked asset
#[derive(Debug, Clone, PartialEq)]
pub struct BakedMesh {
    /// `<baseName>_skin<K>_LOD<L>`
    pub name: String,
    /// Index of the source skinned sub-mesh
    pub skin_index: u16,
    /// LOD level this mesh was remapped for
    pub lod: u8,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    /// Packed bone influences, one per vertex
    pub influences: Vec<PackedInfluence>,
    /// Bind poses in canonical bone order (column-major 4x4)
    pub bind_poses: Vec<[f32; 16]>,
}

impl BakedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A complete baked asset
#[derive(Debug, Clone, PartialEq)]
pub struct BakedAsset {
    /// Canonical bone list
    pub bones: Vec<BakedBone>,
    /// Number of LOD levels described by the bone LOD masks
    pub lod_count: u8,
    /// Deduplicated track pool
    pub tracks: Vec<BakedTrack>,
    /// Animations; index 0 is always the rest pose
    pub animations: Vec<BakedAnimation>,
    pub meshes: Vec<BakedMesh>,
}

impl BakedAsset {
    pub fn header(&self) -> BakedAssetHeader {
        BakedAssetHeader::new(
            self.bones.len() as u16,
            self.lod_count,
            self.tracks.len() as u32,
            self.animations.len() as u32,
            self.meshes.len() as u32,
        )
    }

    /// Find an animation by name
    pub fn animation(&self, name: &str) -> Option<&BakedAnimation> {
        self.animations.iter().find(|a| a.name == name)
    }

    /// Find a bone's canonical index by name
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Pooled track for an (animation, bone) pair
    pub fn track(&self, animation: usize, bone: usize) -> Option<&BakedTrack> {
        let index = *self.animations.get(animation)?.track_indices.get(bone)?;
        self.tracks.get(index as usize)
    }

    /// Find a mesh by skin index and LOD level
    pub fn mesh(&self, skin_index: u16, lod: u8) -> Option<&BakedMesh> {
        self.meshes
            .iter()
            .find(|m| m.skin_index == skin_index && m.lod == lod)
    }
}
