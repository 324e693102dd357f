//! Bake pipeline errors

use std::path::PathBuf;

use bake_common::{FormatError, PackingError};

/// Why a skeleton cannot be baked
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyIssue {
    #[error("skeleton has no bones")]
    Empty,

    #[error("skeleton has {count} bones, maximum is {max}")]
    TooManyBones { count: usize, max: usize },

    #[error("bone '{bone}' references parent '{parent}' which is not part of the skeleton")]
    MissingParent { bone: String, parent: String },

    #[error("bone '{bone}' is part of a parent cycle")]
    ParentCycle { bone: String },

    #[error("bone '{bone}' has no ancestor animated at LOD {lod}")]
    NoLodAncestor { bone: String, lod: u8 },
}

/// Errors raised by the bake pipeline
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("unsupported topology: {0}")]
    UnsupportedTopology(TopologyIssue),

    #[error("clip '{clip}' has no keyframes")]
    EmptyKeyframeSet { clip: String },

    #[error("clip '{clip}' is invalid: {reason}")]
    InvalidClip { clip: String, reason: String },

    #[error("mesh '{mesh}' references bone '{bone}' which is not part of the skeleton")]
    BoneSubsetMismatch { mesh: String, bone: String },

    #[error("mesh '{mesh}' is invalid: {reason}")]
    InvalidMesh { mesh: String, reason: String },

    #[error("mesh '{mesh}' vertex {vertex}: {source}")]
    PackingRange {
        mesh: String,
        vertex: usize,
        #[source]
        source: PackingError,
    },

    #[error("invalid bake settings: {0}")]
    InvalidSettings(String),

    #[error("sampling clip '{clip}' at {time}s failed: {reason}")]
    Sampler {
        clip: String,
        time: f32,
        reason: String,
    },

    #[error("bake aborted")]
    Aborted,

    #[error("failed to save {path:?}: {source}")]
    SaveFailure {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

impl From<TopologyIssue> for BakeError {
    fn from(issue: TopologyIssue) -> Self {
        Self::UnsupportedTopology(issue)
    }
}
