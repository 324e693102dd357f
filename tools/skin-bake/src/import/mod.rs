//! Input adapters
//!
//! Turn authoring formats into a [`BakeInput`](crate::model::BakeInput) plus
//! a matching [`PoseSampler`](crate::model::PoseSampler).

mod gltf;

pub use self::gltf::{GltfPoseSampler, load_gltf};
