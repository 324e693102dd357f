//! Bake input description
//!
//! The caller builds a [`BakeInput`] once. The pipeline never inspects a
//! live scene graph.

use bake_common::BoneTransform;

use crate::error::BakeError;

/// Column-major 4x4 identity, used for bones a mesh does not reference
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// A named skeleton node with an optional parent link
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDesc {
    pub name: String,
    /// Parent bone name, `None` for roots
    pub parent: Option<String>,
    /// Local bind transform
    pub bind: BoneTransform,
    /// Highest LOD level at which the bone is animated independently.
    /// `None` means every LOD.
    pub lod_support: Option<u8>,
}

impl BoneDesc {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            bind: BoneTransform::IDENTITY,
            lod_support: None,
        }
    }

    pub fn with_bind(mut self, bind: BoneTransform) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_lod_support(mut self, lod: u8) -> Self {
        self.lod_support = Some(lod);
        self
    }
}

/// A named animation clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDesc {
    pub name: String,
    /// Clip length in seconds
    pub duration: f32,
    /// Raw keyframe times gathered from every animated channel (unordered, may repeat)
    pub keyframe_times: Vec<f32>,
}

/// A skin-weighted sub-mesh referencing a subset of the skeleton
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshDesc {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    /// Mesh-local bone slots, by skeleton bone name
    pub bones: Vec<String>,
    /// Bind pose per mesh-local bone slot (column-major 4x4)
    pub bind_poses: Vec<[f32; 16]>,
    /// Up to 4 mesh-local bone slots per vertex
    pub joints: Vec<[u16; 4]>,
    /// Weight per joint slot
    pub weights: Vec<[f32; 4]>,
    /// LOD levels this mesh participates in. Empty means every LOD.
    pub lod_levels: Vec<u8>,
}

/// Everything needed to bake one character
#[derive(Debug, Clone, PartialEq)]
pub struct BakeInput {
    /// Base name for generated meshes
    pub name: String,
    pub bones: Vec<BoneDesc>,
    pub meshes: Vec<MeshDesc>,
    pub clips: Vec<ClipDesc>,
}

/// Pipeline settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeSettings {
    /// Forced sampling timestep in seconds. Disabled when `None` or ≤ 0.
    pub sample_step: Option<f32>,
    /// Number of LOD levels (1-8)
    pub lod_count: u8,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            sample_step: None,
            lod_count: 1,
        }
    }
}

/// Stateful pose sampling primitive
///
/// The pipeline calls `apply_pose` with strictly increasing times per clip,
/// reads every bone with `local_transform`, and calls `restore` once when it
/// is done, whatever the outcome.
pub trait PoseSampler {
    /// Apply the pose of `clip` at `time` seconds
    fn apply_pose(&mut self, clip: &str, time: f32) -> Result<(), BakeError>;

    /// Local transform of a bone in the currently applied pose.
    ///
    /// `None` means the sampler has no data for the bone; its bind transform is used.
    fn local_transform(&self, bone: &str) -> Option<BoneTransform>;

    /// Return the sampler to its pre-sampling state
    fn restore(&mut self);
}
