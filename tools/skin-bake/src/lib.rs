//! skin-bake library
//!
//! Offline baking of rigged, animated models into a deduplicated track pool,
//! an animation index and per-LOD meshes with packed bone influences.
//!
//! The pipeline runs in stages:
//! hierarchy analysis → keyframe resolution → mesh composition → sampling
//! → track deduplication. [`BakeSession`] drives them in that order.

pub mod bake;
pub mod dedup;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod inspect;
pub mod keyframes;
pub mod lod;
pub mod manifest;
pub mod mesh;
pub mod model;
pub mod pose;
pub mod sampler;
pub mod session;
pub mod store;

// Re-export the pipeline entry points
pub use bake::{BakeJob, run_job};
pub use error::{BakeError, TopologyIssue};
pub use model::{BakeInput, BakeSettings, BoneDesc, ClipDesc, MeshDesc, PoseSampler};
pub use session::{AbortHandle, BakeSession, SessionState};
pub use store::{ArtifactStore, FileStore};

// Re-export stage types
pub use dedup::{TrackDeduplicator, TrackPool};
pub use hierarchy::{Skeleton, analyze_hierarchy};
pub use keyframes::{SampleTimes, resolve_sample_times};
pub use lod::{LodRemap, remap_bone_for_lod};
pub use mesh::{compose_meshes, mesh_name};

// Re-export adapters
pub use import::{GltfPoseSampler, load_gltf};
pub use pose::{Channel, ChannelPoseSampler, ChannelValues, Interpolation};
