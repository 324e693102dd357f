//! Mesh composition
//!
//! Produces one baked mesh per (skinned sub-mesh, LOD level): influences are
//! re-indexed into canonical bone order, LOD-remapped and packed; bind poses
//! are re-indexed; geometry is copied unchanged. Source meshes are never mutated.
//!
//! A bone that stands in for a culled bone at some LOD gets an inverse bind
//! derived from the culled bone's one, so remapped vertices stay in place.

use bake_common::{BakedMesh, BoneTransform, INFLUENCES_PER_VERTEX, pack_influences};
use glam::{Mat4, Quat, Vec3};
use hashbrown::HashSet;

use crate::error::BakeError;
use crate::hierarchy::Skeleton;
use crate::lod::LodRemap;
use crate::model::{IDENTITY_MATRIX, MeshDesc};

/// Deterministic name of a baked mesh
pub fn mesh_name(base_name: &str, skin_index: usize, lod: u8) -> String {
    format!("{base_name}_skin{skin_index}_LOD{lod}")
}

/// Map each mesh-local bone slot to its canonical bone index
///
/// Fails with [`BakeError::BoneSubsetMismatch`] if a slot names a bone that is
/// not part of the skeleton, and with [`BakeError::DuplicateName`] if two slots
/// name the same bone (the mapping must be one-to-one).
pub fn mesh_bone_remap(skeleton: &Skeleton, mesh: &MeshDesc) -> Result<Vec<usize>, BakeError> {
    let mut seen = HashSet::with_capacity(mesh.bones.len());
    mesh.bones
        .iter()
        .map(|name| {
            let index = skeleton
                .index_of(name)
                .ok_or_else(|| BakeError::BoneSubsetMismatch {
                    mesh: mesh.name.clone(),
                    bone: name.clone(),
                })?;
            if !seen.insert(index) {
                return Err(BakeError::DuplicateName {
                    kind: "mesh bone",
                    name: name.clone(),
                });
            }
            Ok(index)
        })
        .collect()
}

/// Check per-vertex array lengths, joint slots and LOD levels of a mesh
pub fn validate_mesh(mesh: &MeshDesc, lod_count: u8) -> Result<(), BakeError> {
    let invalid = |reason: String| BakeError::InvalidMesh {
        mesh: mesh.name.clone(),
        reason,
    };
    let vertex_count = mesh.positions.len();

    if mesh.joints.len() != vertex_count || mesh.weights.len() != vertex_count {
        return Err(invalid(format!(
            "{} vertices but {} joint sets and {} weight sets",
            vertex_count,
            mesh.joints.len(),
            mesh.weights.len()
        )));
    }
    if mesh.normals.as_ref().is_some_and(|n| n.len() != vertex_count) {
        return Err(invalid("normal count does not match vertex count".into()));
    }
    if mesh.uvs.as_ref().is_some_and(|u| u.len() != vertex_count) {
        return Err(invalid("uv count does not match vertex count".into()));
    }
    if mesh.bind_poses.len() != mesh.bones.len() {
        return Err(invalid(format!(
            "{} bones but {} bind poses",
            mesh.bones.len(),
            mesh.bind_poses.len()
        )));
    }
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(invalid(format!(
            "index {} out of range for {} vertices",
            index, vertex_count
        )));
    }
    if let Some((vertex, joint)) = mesh.joints.iter().enumerate().find_map(|(v, joints)| {
        joints
            .iter()
            .find(|&&j| j as usize >= mesh.bones.len())
            .map(|&j| (v, j))
    }) {
        return Err(invalid(format!(
            "vertex {} uses bone slot {} but the mesh has {} bones",
            vertex,
            joint,
            mesh.bones.len()
        )));
    }
    if let Some(&lod) = mesh.lod_levels.iter().find(|&&l| l >= lod_count) {
        return Err(invalid(format!(
            "LOD level {} out of range (lod_count is {})",
            lod, lod_count
        )));
    }
    Ok(())
}

/// LOD levels a mesh is baked for
fn mesh_lods(mesh: &MeshDesc, lod_count: u8) -> Vec<u8> {
    if mesh.lod_levels.is_empty() {
        (0..lod_count).collect()
    } else {
        let mut lods = mesh.lod_levels.clone();
        lods.sort_unstable();
        lods.dedup();
        lods
    }
}

/// Compose every skinned sub-mesh at every LOD level it participates in
///
/// Output order: sub-mesh by sub-mesh, LOD ascending.
pub fn compose_meshes(
    base_name: &str,
    skeleton: &Skeleton,
    meshes: &[MeshDesc],
) -> Result<Vec<BakedMesh>, BakeError> {
    let remaps = (0..skeleton.lod_count())
        .map(|lod| LodRemap::new(skeleton, lod))
        .collect::<Result<Vec<_>, _>>()?;

    let mut baked = Vec::new();
    for (skin_index, mesh) in meshes.iter().enumerate() {
        validate_mesh(mesh, skeleton.lod_count())?;
        let bone_remap = mesh_bone_remap(skeleton, mesh)?;

        for lod in mesh_lods(mesh, skeleton.lod_count()) {
            let lod_remap = &remaps[lod as usize];
            let out = compose_mesh(base_name, skin_index, mesh, skeleton, &bone_remap, lod_remap)?;
            tracing::debug!(
                "Composed '{}': {} vertices, {} bones culled",
                out.name,
                out.vertex_count(),
                lod_remap.culled_count()
            );
            baked.push(out);
        }
    }
    Ok(baked)
}

fn compose_mesh(
    base_name: &str,
    skin_index: usize,
    mesh: &MeshDesc,
    skeleton: &Skeleton,
    bone_remap: &[usize],
    lod_remap: &LodRemap,
) -> Result<BakedMesh, BakeError> {
    let skin_index_u16 = u16::try_from(skin_index).map_err(|_| BakeError::InvalidMesh {
        mesh: mesh.name.clone(),
        reason: format!("skin index {} exceeds {}", skin_index, u16::MAX),
    })?;

    let influences = mesh
        .joints
        .iter()
        .zip(&mesh.weights)
        .enumerate()
        .map(|(vertex, (joints, weights))| {
            let mut indices = [0u32; INFLUENCES_PER_VERTEX];
            for (slot, &joint) in joints.iter().enumerate() {
                indices[slot] = lod_remap.map(bone_remap[joint as usize]) as u32;
            }
            pack_influences(indices, *weights).map_err(|source| BakeError::PackingRange {
                mesh: mesh.name.clone(),
                vertex,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut bind_poses: Vec<Option<[f32; 16]>> = vec![None; skeleton.len()];
    for (slot, &bone) in bone_remap.iter().enumerate() {
        bind_poses[bone] = Some(mesh.bind_poses[slot]);
    }
    // First culled bone in slot order provides the substitute's bind
    for (slot, &bone) in bone_remap.iter().enumerate() {
        let substitute = lod_remap.map(bone);
        if bind_poses[substitute].is_none() {
            bind_poses[substitute] = Some(ancestor_bind_pose(
                skeleton,
                substitute,
                bone,
                &mesh.bind_poses[slot],
            ));
        }
    }
    let bind_poses = bind_poses
        .into_iter()
        .map(|pose| pose.unwrap_or(IDENTITY_MATRIX))
        .collect();

    Ok(BakedMesh {
        name: mesh_name(base_name, skin_index, lod_remap.lod()),
        skin_index: skin_index_u16,
        lod: lod_remap.lod(),
        positions: mesh.positions.clone(),
        normals: mesh.normals.clone(),
        uvs: mesh.uvs.clone(),
        indices: mesh.indices.clone(),
        influences,
        bind_poses,
    })
}

fn local_matrix(bind: &BoneTransform) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::from(bind.scale),
        Quat::from_array(bind.rotation),
        Vec3::from(bind.position),
    )
}

/// Inverse bind of `ancestor`, derived from the inverse bind of its descendant `bone`
///
/// `inverse(world(ancestor)) = local(child) * ... * local(bone) * inverse(world(bone))`,
/// walking the local bind transforms below `ancestor` down to `bone`.
fn ancestor_bind_pose(
    skeleton: &Skeleton,
    ancestor: usize,
    bone: usize,
    bind_pose: &[f32; 16],
) -> [f32; 16] {
    let mut chain = Mat4::IDENTITY;
    let mut current = Some(bone);
    while let Some(index) = current.filter(|&i| i != ancestor) {
        let node = skeleton.bone(index);
        chain = local_matrix(&node.bind) * chain;
        current = node.parent;
    }
    (chain * Mat4::from_cols_array(bind_pose)).to_cols_array()
}
