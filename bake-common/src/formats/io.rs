//! Baked asset reading and writing

use std::io::Write;

use super::header::BakedAssetHeader;
use super::serialization::BinarySerializable;
use super::types::{
    BakedAnimation, BakedAsset, BakedBone, BakedMesh, BakedTrack, BoneTransform, NO_PARENT,
};
use crate::packing::PackedInfluence;

/// Errors raised while reading or writing a baked asset
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated {section}: needed {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("invalid header: {0:?}")]
    InvalidHeader(BakedAssetHeader),

    #[error("invalid UTF-8 in {0} name")]
    InvalidName(&'static str),

    #[error("{kind} name '{name}' is {len} bytes, maximum is {max}", max = u16::MAX)]
    NameTooLong {
        kind: &'static str,
        name: String,
        len: usize,
    },

    #[error("bone {bone} has parent {parent}, parents must precede their children")]
    InvalidParent { bone: usize, parent: u16 },

    #[error("animation '{animation}' references track {index}, pool has {pool_size}")]
    TrackIndexOutOfRange {
        animation: String,
        index: u32,
        pool_size: usize,
    },

    #[error("{what} has {actual} entries, expected {expected}")]
    CountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("{0} exceeds the format's count limit")]
    TooLarge(&'static str),

    #[error("{0} trailing bytes after the last mesh")]
    TrailingBytes(usize),
}

// ============================================================================
// Writing
// ============================================================================

fn write_name<W: Write>(w: &mut W, kind: &'static str, name: &str) -> Result<(), FormatError> {
    let len = u16::try_from(name.len()).map_err(|_| FormatError::NameTooLong {
        kind,
        name: name.to_string(),
        len: name.len(),
    })?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(name.as_bytes())?;
    Ok(())
}

fn write_count<W: Write>(w: &mut W, what: &'static str, count: usize) -> Result<(), FormatError> {
    let count = u32::try_from(count).map_err(|_| FormatError::TooLarge(what))?;
    w.write_all(&count.to_le_bytes())?;
    Ok(())
}

/// Write fixed-size records back to back
fn write_records<W: Write, T: BinarySerializable>(
    w: &mut W,
    records: &[T],
) -> Result<(), FormatError> {
    let mut bytes = Vec::with_capacity(records.len() * T::SIZE);
    for record in records {
        bytes.extend(record.serialize());
    }
    w.write_all(&bytes)?;
    Ok(())
}

fn check_len(what: String, expected: usize, actual: usize) -> Result<(), FormatError> {
    if expected != actual {
        return Err(FormatError::CountMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Write a complete baked asset
///
/// The asset is validated while writing: every animation must index one track
/// per bone, every mesh must carry one influence per vertex and one bind pose per bone.
pub fn write_baked_asset<W: Write>(w: &mut W, asset: &BakedAsset) -> Result<(), FormatError> {
    if asset.bones.len() >= NO_PARENT as usize {
        return Err(FormatError::TooLarge("bone count"));
    }
    let header = asset.header();
    if !header.validate() {
        return Err(FormatError::InvalidHeader(header));
    }
    let bone_count = asset.bones.len();
    w.write_all(&header.serialize())?;

    for (index, bone) in asset.bones.iter().enumerate() {
        if let Some(parent) = bone.parent.filter(|&p| p as usize >= index) {
            return Err(FormatError::InvalidParent {
                bone: index,
                parent,
            });
        }
        write_name(w, "bone", &bone.name)?;
        w.write_all(&bone.parent.unwrap_or(NO_PARENT).to_le_bytes())?;
        w.write_all(&[bone.lod_mask])?;
    }

    for track in &asset.tracks {
        write_count(w, "track sample count", track.samples.len())?;
        write_records(w, &track.samples)?;
    }

    for animation in &asset.animations {
        check_len(
            format!("animation '{}' track indices", animation.name),
            bone_count,
            animation.track_indices.len(),
        )?;
        if let Some(&index) = animation
            .track_indices
            .iter()
            .find(|&&i| i as usize >= asset.tracks.len())
        {
            return Err(FormatError::TrackIndexOutOfRange {
                animation: animation.name.clone(),
                index,
                pool_size: asset.tracks.len(),
            });
        }
        write_name(w, "animation", &animation.name)?;
        write_count(w, "animation sample count", animation.sample_times.len())?;
        write_records(w, &animation.sample_times)?;
        write_records(w, &animation.track_indices)?;
    }

    for mesh in &asset.meshes {
        write_mesh(w, mesh, bone_count)?;
    }

    Ok(())
}

fn write_mesh<W: Write>(w: &mut W, mesh: &BakedMesh, bone_count: usize) -> Result<(), FormatError> {
    let vertex_count = mesh.vertex_count();
    check_len(
        format!("mesh '{}' influences", mesh.name),
        vertex_count,
        mesh.influences.len(),
    )?;
    check_len(
        format!("mesh '{}' bind poses", mesh.name),
        bone_count,
        mesh.bind_poses.len(),
    )?;
    if let Some(normals) = &mesh.normals {
        check_len(format!("mesh '{}' normals", mesh.name), vertex_count, normals.len())?;
    }
    if let Some(uvs) = &mesh.uvs {
        check_len(format!("mesh '{}' uvs", mesh.name), vertex_count, uvs.len())?;
    }

    write_name(w, "mesh", &mesh.name)?;
    w.write_all(&mesh.skin_index.to_le_bytes())?;
    w.write_all(&[mesh.lod])?;
    write_count(w, "vertex count", vertex_count)?;
    write_count(w, "index count", mesh.indices.len())?;

    write_records(w, &mesh.positions)?;
    match &mesh.normals {
        Some(normals) => {
            w.write_all(&[1])?;
            write_records(w, normals)?;
        }
        None => w.write_all(&[0])?,
    }
    match &mesh.uvs {
        Some(uvs) => {
            w.write_all(&[1])?;
            write_records(w, uvs)?;
        }
        None => w.write_all(&[0])?,
    }
    write_records(w, &mesh.indices)?;
    write_records(w, &mesh.influences)?;
    write_records(w, &mesh.bind_poses)?;
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, section: &'static str, len: usize) -> Result<&'a [u8], FormatError> {
        if len > self.remaining() {
            return Err(FormatError::Truncated {
                section,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn u8(&mut self, section: &'static str) -> Result<u8, FormatError> {
        Ok(self.take(section, 1)?[0])
    }

    fn u16(&mut self, section: &'static str) -> Result<u16, FormatError> {
        let b = self.take(section, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, section: &'static str) -> Result<u32, FormatError> {
        let b = self.take(section, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self, section: &'static str) -> Result<String, FormatError> {
        let len = self.u16(section)? as usize;
        let bytes = self.take(section, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| FormatError::InvalidName(section))
    }

    /// Read `count` fixed-size records, checking the byte budget before allocating
    fn records<T: BinarySerializable>(
        &mut self,
        section: &'static str,
        count: usize,
    ) -> Result<Vec<T>, FormatError> {
        let len = count
            .checked_mul(T::SIZE)
            .ok_or(FormatError::TooLarge(section))?;
        let bytes = self.take(section, len)?;
        bytes
            .chunks_exact(T::SIZE)
            .map(|chunk| {
                T::deserialize(chunk).ok_or(FormatError::Truncated {
                    section,
                    needed: T::SIZE,
                    available: chunk.len(),
                })
            })
            .collect()
    }
}

/// Parse a complete baked asset from bytes
pub fn read_baked_asset(bytes: &[u8]) -> Result<BakedAsset, FormatError> {
    let mut r = ByteReader::new(bytes);
    let header_bytes = r.take("header", BakedAssetHeader::SIZE)?;
    let header = BakedAssetHeader::deserialize(header_bytes).ok_or(FormatError::Truncated {
        section: "header",
        needed: BakedAssetHeader::SIZE,
        available: header_bytes.len(),
    })?;
    if !header.validate() {
        return Err(FormatError::InvalidHeader(header));
    }
    let bone_count = header.bone_count as usize;

    let mut bones = Vec::with_capacity(bone_count);
    for index in 0..bone_count {
        let name = r.name("bone")?;
        let parent = match r.u16("bone")? {
            NO_PARENT => None,
            p if (p as usize) < index => Some(p),
            p => {
                return Err(FormatError::InvalidParent {
                    bone: index,
                    parent: p,
                });
            }
        };
        let lod_mask = r.u8("bone")?;
        bones.push(BakedBone {
            name,
            parent,
            lod_mask,
        });
    }

    let mut tracks = Vec::new();
    for _ in 0..header.track_count {
        let sample_count = r.u32("track")? as usize;
        let samples: Vec<BoneTransform> = r.records("track", sample_count)?;
        tracks.push(BakedTrack::new(samples));
    }

    let mut animations = Vec::new();
    for _ in 0..header.animation_count {
        let name = r.name("animation")?;
        let sample_count = r.u32("animation")? as usize;
        let sample_times: Vec<f32> = r.records("animation", sample_count)?;
        let track_indices: Vec<u32> = r.records("animation", bone_count)?;
        if let Some(&index) = track_indices
            .iter()
            .find(|&&i| i as usize >= tracks.len())
        {
            return Err(FormatError::TrackIndexOutOfRange {
                animation: name,
                index,
                pool_size: tracks.len(),
            });
        }
        animations.push(BakedAnimation {
            name,
            sample_times,
            track_indices,
        });
    }

    let mut meshes = Vec::new();
    for _ in 0..header.mesh_count {
        meshes.push(read_mesh(&mut r, bone_count)?);
    }

    if r.remaining() > 0 {
        return Err(FormatError::TrailingBytes(r.remaining()));
    }

    Ok(BakedAsset {
        bones,
        lod_count: header.lod_count,
        tracks,
        animations,
        meshes,
    })
}

fn read_mesh(r: &mut ByteReader<'_>, bone_count: usize) -> Result<BakedMesh, FormatError> {
    let name = r.name("mesh")?;
    let skin_index = r.u16("mesh")?;
    let lod = r.u8("mesh")?;
    let vertex_count = r.u32("mesh")? as usize;
    let index_count = r.u32("mesh")? as usize;

    let positions = r.records("mesh positions", vertex_count)?;
    let normals = match r.u8("mesh")? {
        0 => None,
        _ => Some(r.records("mesh normals", vertex_count)?),
    };
    let uvs = match r.u8("mesh")? {
        0 => None,
        _ => Some(r.records("mesh uvs", vertex_count)?),
    };
    let indices = r.records("mesh indices", index_count)?;
    let influences: Vec<PackedInfluence> = r.records("mesh influences", vertex_count)?;
    let bind_poses = r.records("mesh bind poses", bone_count)?;

    Ok(BakedMesh {
        name,
        skin_index,
        lod,
        positions,
        normals,
        uvs,
        indices,
        influences,
        bind_poses,
    })
}
