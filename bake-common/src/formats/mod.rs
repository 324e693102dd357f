//! Baked asset binary format
//!
//! A baked asset is a POD, little-endian file - no magic bytes, the format is
//! determined by context. It carries everything a runtime consumer needs to
//! render animated instances:
//!
//! ```text
//! Header (16 bytes, see BakedAssetHeader)
//! Bones       bone_count × { name, parent u16 (0xFFFF = none), lod_mask u8 }
//! Tracks      track_count × { sample_count u32, samples × BoneTransform (40 bytes) }
//! Animations  animation_count × { name, sample_count u32, times f32 × n,
//!                                 track index u32 × bone_count }
//! Meshes      mesh_count × { name, skin u16, lod u8, vertex_count u32, index_count u32,
//!                            positions, [normals], [uvs], indices u32,
//!                            packed influences (16 bytes each), bind poses f32×16 × bone_count }
//! ```
//!
//! Strings are stored as a u16 byte length followed by UTF-8 bytes.

mod header;
mod io;
mod serialization;
mod types;


/// File extension of baked assets
pub const BAKED_ASSET_EXT: &str = "skbake";

pub use header::BakedAssetHeader;
pub use io::{FormatError, read_baked_asset, write_baked_asset};
pub use serialization::BinarySerializable;
pub use types::{
    BONE_TRANSFORM_SIZE, BakedAnimation, BakedAsset, BakedBone, BakedMesh, BakedTrack,
    BoneTransform, NO_PARENT,
};
