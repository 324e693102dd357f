//! Baked asset header

/// Baked asset header (16 bytes)
///
/// ```text
/// 0x00: bone_count u16 LE
/// 0x02: lod_count u8
/// 0x03: flags u8          - Reserved, must be 0
/// 0x04: track_count u32 LE
/// 0x08: animation_count u32 LE
/// 0x0C: mesh_count u32 LE
/// ```
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct BakedAssetHeader {
    /// Number of bones in canonical order
    pub bone_count: u16,
    /// Number of LOD levels described by the bone LOD masks
    pub lod_count: u8,
    /// Reserved flags (must be 0)
    pub flags: u8,
    /// Number of unique tracks in the pool
    pub track_count: u32,
    /// Number of animations (rest pose included)
    pub animation_count: u32,
    /// Number of per-skin, per-LOD meshes
    pub mesh_count: u32,
}

impl BakedAssetHeader {
    pub const SIZE: usize = 16;

    pub fn new(
        bone_count: u16,
        lod_count: u8,
        track_count: u32,
        animation_count: u32,
        mesh_count: u32,
    ) -> Self {
        Self {
            bone_count,
            lod_count,
            flags: 0,
            track_count,
            animation_count,
            mesh_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes[2] = self.lod_count;
        bytes[3] = self.flags;
        bytes[4..8].copy_from_slice(&self.track_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.animation_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.mesh_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            bone_count: u16::from_le_bytes([bytes[0], bytes[1]]),
            lod_count: bytes[2],
            flags: bytes[3],
            track_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            animation_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            mesh_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    /// Validate header
    ///
    /// A baked asset always has at least one bone, one track and the rest pose animation.
    pub fn validate(&self) -> bool {
        self.bone_count > 0
            && self.lod_count > 0
            && self.lod_count <= 8
            && self.track_count > 0
            && self.animation_count > 0
            && self.flags == 0
    }
}
