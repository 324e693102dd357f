//! Shared types and utilities for baked skinned-animation assets
//!
//! This crate provides everything shared between:
//! - `skin-bake` (offline baking pipeline)
//! - runtime consumers that render instances from a baked asset
//!
//! # Modules
//!
//! - [`packing`] - Bone index/weight packing into vertex scalar channels
//! - [`formats`] - Baked asset binary format (bones, track pool, animation index, meshes)

pub mod formats;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    INFLUENCES_PER_VERTEX, MAX_PACKED_INDEX, PackedInfluence, PackingError, pack_index_pair,
    pack_influences, pack_weight_pair, unpack_index_pair, unpack_influences, unpack_weight_pair,
};

// Re-export commonly used format items
pub use formats::{
    BAKED_ASSET_EXT, BONE_TRANSFORM_SIZE, BakedAnimation, BakedAsset, BakedAssetHeader, BakedBone,
    BakedMesh, BakedTrack, BinarySerializable, BoneTransform, FormatError, NO_PARENT,
    read_baked_asset, write_baked_asset,
};
