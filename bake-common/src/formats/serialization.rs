//! Binary serialization trait for fixed-size records.
//!
//! Every record of the baked format (header, transforms, packed influences,
//! scalars and float arrays) goes through `BinarySerializable`, so all
//! multi-byte values are written little-endian whatever the host.

use crate::packing::PackedInfluence;

/// Trait for binary-serializable fixed-size records.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use bake_common::formats::{BakedAssetHeader, BinarySerializable};
///
/// let header = BakedAssetHeader::new(3, 2, 5, 2, 4);
/// let bytes = header.serialize();
/// let parsed = BakedAssetHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, header);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::BakedAssetHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::BoneTransform {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for u32 {
    const SIZE: usize = 4;

    fn serialize(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl BinarySerializable for f32 {
    const SIZE: usize = 4;

    fn serialize(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..4)?;
        Some(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Vertex attributes and matrices (`[f32; 2]`, `[f32; 3]`, `[f32; 16]`)
impl<const N: usize> BinarySerializable for [f32; N] {
    const SIZE: usize = 4 * N;

    fn serialize(&self) -> Vec<u8> {
        self.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut out = [0.0f32; N];
        for (value, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Some(out)
    }
}

impl BinarySerializable for PackedInfluence {
    const SIZE: usize = PackedInfluence::SIZE;

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = self.indices.serialize();
        bytes.extend(self.weights.serialize());
        bytes
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            indices: <[f32; 2]>::deserialize(&bytes[..8])?,
            weights: <[f32; 2]>::deserialize(&bytes[8..16])?,
        })
    }
}
