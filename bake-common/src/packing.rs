//! Bone influence packing
//!
//! Packs the four bone indices and four weights of a vertex into two
//! 2-component scalar channels:
//! - indices: `[i0 * 1000 + i1, i2 * 1000 + i3]`
//! - weights: `[q(w0) * 1000 + q(w1), q(w2) * 1000 + q(w3)]` with `q(w) = round(999 * w)`
//!
//! Every packed value is at most 999_999, which is below 2^24 and therefore
//! exactly representable in f32. Indices round-trip exactly, weights within 1/999.

use bytemuck::{Pod, Zeroable};

/// Largest bone index that can be packed
pub const MAX_PACKED_INDEX: u32 = 999;

/// Number of bone influences carried per vertex
pub const INFLUENCES_PER_VERTEX: usize = 4;

/// Radix used to combine two packed values into one scalar
const PACK_BASE: u32 = 1000;

/// Weight quantization steps (weights are stored as round(999 * w))
const WEIGHT_STEPS: f32 = 999.0;

/// Error raised when an influence falls outside the packable range.
///
/// Usually signals corrupted source weights or a skeleton beyond the bone cap.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackingError {
    #[error("bone index {0} exceeds packable maximum {MAX_PACKED_INDEX}")]
    IndexOutOfRange(u32),

    #[error("bone weight {0} is outside [0, 1]")]
    WeightOutOfRange(f32),
}

/// Packed per-vertex influences (16 bytes)
///
/// Two scalar channels of two components each, ready for a float vertex attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedInfluence {
    /// `[i0 * 1000 + i1, i2 * 1000 + i3]`
    pub indices: [f32; 2],
    /// `[q(w0) * 1000 + q(w1), q(w2) * 1000 + q(w3)]`
    pub weights: [f32; 2],
}

impl PackedInfluence {
    /// Size in bytes (16)
    pub const SIZE: usize = 16;
}

/// Pack two bone indices into one scalar
#[inline]
pub fn pack_index_pair(a: u32, b: u32) -> Result<f32, PackingError> {
    for index in [a, b] {
        if index > MAX_PACKED_INDEX {
            return Err(PackingError::IndexOutOfRange(index));
        }
    }
    Ok((a * PACK_BASE + b) as f32)
}

/// Recover the two bone indices from a packed scalar
#[inline]
pub fn unpack_index_pair(packed: f32) -> [u32; 2] {
    let value = packed.round() as u32;
    [value / PACK_BASE, value % PACK_BASE]
}

#[inline]
fn quantize_weight(weight: f32) -> Result<u32, PackingError> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&weight) {
        return Err(PackingError::WeightOutOfRange(weight));
    }
    Ok((weight * WEIGHT_STEPS).round() as u32)
}

/// Pack two bone weights into one scalar
#[inline]
pub fn pack_weight_pair(a: f32, b: f32) -> Result<f32, PackingError> {
    let qa = quantize_weight(a)?;
    let qb = quantize_weight(b)?;
    Ok((qa * PACK_BASE + qb) as f32)
}

/// Recover the two bone weights from a packed scalar
#[inline]
pub fn unpack_weight_pair(packed: f32) -> [f32; 2] {
    let value = packed.round() as u32;
    [
        (value / PACK_BASE) as f32 / WEIGHT_STEPS,
        (value % PACK_BASE) as f32 / WEIGHT_STEPS,
    ]
}

/// Pack the four influences of one vertex
pub fn pack_influences(
    indices: [u32; INFLUENCES_PER_VERTEX],
    weights: [f32; INFLUENCES_PER_VERTEX],
) -> Result<PackedInfluence, PackingError> {
    Ok(PackedInfluence {
        indices: [
            pack_index_pair(indices[0], indices[1])?,
            pack_index_pair(indices[2], indices[3])?,
        ],
        weights: [
            pack_weight_pair(weights[0], weights[1])?,
            pack_weight_pair(weights[2], weights[3])?,
        ],
    })
}

/// Decode the four influences of one vertex
pub fn unpack_influences(
    packed: &PackedInfluence,
) -> ([u32; INFLUENCES_PER_VERTEX], [f32; INFLUENCES_PER_VERTEX]) {
    let [i0, i1] = unpack_index_pair(packed.indices[0]);
    let [i2, i3] = unpack_index_pair(packed.indices[1]);
    let [w0, w1] = unpack_weight_pair(packed.weights[0]);
    let [w2, w3] = unpack_weight_pair(packed.weights[1]);
    ([i0, i1, i2, i3], [w0, w1, w2, w3])
}
