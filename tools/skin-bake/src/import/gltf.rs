//! glTF/GLB adapter
//!
//! Builds a [`BakeInput`] and a keyframe pose sampler from a glTF document.

use std::path::Path;

use anyhow::{Context, Result, bail};
use bake_common::BoneTransform;
use glam::{Quat, Vec3};
use hashbrown::{HashMap, HashSet};

use crate::model::{BakeInput, BoneDesc, ClipDesc, IDENTITY_MATRIX, MeshDesc};
use crate::pose::{Channel, ChannelPoseSampler, ChannelValues, Interpolation};

/// Pose sampler produced by [`load_gltf`]
pub type GltfPoseSampler = ChannelPoseSampler;

/// Load a glTF/GLB file
///
/// - skeleton: union of every skin's joints, parented to their nearest joint ancestor
/// - meshes: one per skinned primitive
/// - clips: one per animation, raw keyframe times are the union of its channel inputs
pub fn load_gltf(path: &Path) -> Result<(BakeInput, GltfPoseSampler)> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());

    let (bones, joint_names) = read_skeleton(&document);
    if bones.is_empty() {
        bail!("No skinned joints found in {:?}", path);
    }

    let meshes = read_meshes(&document, &buffers, &joint_names)?;
    let (clips, channels) = read_clips(&document, &buffers, &joint_names)?;

    let mut sampler = ChannelPoseSampler::new(bones.iter().map(|b| (b.name.clone(), b.bind)));
    for (clip, clip_channels) in clips.iter().zip(channels) {
        sampler.add_clip(clip.name.clone(), clip_channels);
    }

    tracing::info!(
        "Loaded {:?}: {} joints, {} skinned primitives, {} animations",
        path,
        bones.len(),
        meshes.len(),
        clips.len()
    );

    Ok((
        BakeInput {
            name,
            bones,
            meshes,
            clips,
        },
        sampler,
    ))
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn node_bind(node: &gltf::Node) -> BoneTransform {
    let (position, rotation, scale) = node.transform().decomposed();
    BoneTransform {
        rotation,
        position,
        scale,
    }
}

/// Joints of every skin in first-seen order, with a node index -> bone name map
fn read_skeleton(document: &gltf::Document) -> (Vec<BoneDesc>, HashMap<usize, String>) {
    let mut parents: HashMap<usize, usize> = HashMap::new();
    for node in document.nodes() {
        for child in node.children() {
            parents.insert(child.index(), node.index());
        }
    }

    let mut joints = Vec::new();
    let mut seen = HashSet::new();
    for skin in document.skins() {
        for joint in skin.joints() {
            if seen.insert(joint.index()) {
                joints.push(joint);
            }
        }
    }

    let names: HashMap<usize, String> = joints.iter().map(|j| (j.index(), node_name(j))).collect();

    let bones = joints
        .iter()
        .map(|joint| {
            // Skip non-joint intermediate nodes
            let mut parent = parents.get(&joint.index()).copied();
            while let Some(p) = parent {
                if names.contains_key(&p) {
                    break;
                }
                parent = parents.get(&p).copied();
            }
            BoneDesc::new(
                names[&joint.index()].clone(),
                parent.map(|p| names[&p].as_str()),
            )
            .with_bind(node_bind(joint))
        })
        .collect();

    (bones, names)
}

fn flatten_matrix(m: [[f32; 4]; 4]) -> [f32; 16] {
    let mut out = [0.0; 16];
    for (column, values) in m.iter().enumerate() {
        out[column * 4..column * 4 + 4].copy_from_slice(values);
    }
    out
}

/// One mesh per skinned primitive of every node that has both a mesh and a skin
fn read_meshes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    joint_names: &HashMap<usize, String>,
) -> Result<Vec<MeshDesc>> {
    let mut meshes = Vec::new();

    for node in document.nodes() {
        let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) else {
            continue;
        };

        let bones: Vec<String> = skin
            .joints()
            .map(|j| joint_names[&j.index()].clone())
            .collect();
        let bind_poses: Vec<[f32; 16]> = skin
            .reader(|buffer| Some(&buffers[buffer.index()]))
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(flatten_matrix).collect())
            .unwrap_or_else(|| vec![IDENTITY_MATRIX; bones.len()]);

        let base = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let primitive_count = mesh.primitives().count();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0))
            else {
                tracing::warn!(
                    "Mesh '{}' primitive {} has no skinning data, skipping",
                    base,
                    primitive.index()
                );
                continue;
            };

            let name = if primitive_count > 1 {
                format!("{}_{}", base, primitive.index())
            } else {
                base.clone()
            };

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .with_context(|| format!("No positions in mesh '{}'", name))?
                .collect();
            let indices = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            meshes.push(MeshDesc {
                name,
                normals: reader.read_normals().map(|iter| iter.collect()),
                uvs: reader.read_tex_coords(0).map(|iter| iter.into_f32().collect()),
                positions,
                indices,
                bones: bones.clone(),
                bind_poses: bind_poses.clone(),
                joints: joints.into_u16().collect(),
                weights: weights.into_f32().collect(),
                lod_levels: Vec::new(),
            });
        }
    }

    Ok(meshes)
}

/// Keep the value of each (in-tangent, value, out-tangent) triplet
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn read_clips(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    joint_names: &HashMap<usize, String>,
) -> Result<(Vec<ClipDesc>, Vec<Vec<Channel>>)> {
    use gltf::animation::Interpolation as GltfInterpolation;
    use gltf::animation::util::ReadOutputs;

    let mut clips = Vec::new();
    let mut clip_channels = Vec::new();

    for animation in document.animations() {
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));
        let mut keyframe_times = Vec::new();
        let mut channels = Vec::new();

        for channel in animation.channels() {
            let Some(bone) = joint_names.get(&channel.target().node().index()) else {
                continue;
            };

            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let times: Vec<f32> = reader
                .read_inputs()
                .with_context(|| format!("Animation '{}': channel has no input", name))?
                .collect();
            let Some(outputs) = reader.read_outputs() else {
                bail!("Animation '{}': channel on '{}' has no output", name, bone);
            };

            let (cubic, interpolation) = match channel.sampler().interpolation() {
                GltfInterpolation::Linear => (false, Interpolation::Linear),
                GltfInterpolation::Step => (false, Interpolation::Step),
                GltfInterpolation::CubicSpline => (true, Interpolation::Linear),
            };

            let values = match outputs {
                ReadOutputs::Translations(iter) => ChannelValues::Translation(spline_values(
                    iter.map(Vec3::from_array).collect(),
                    cubic,
                )),
                ReadOutputs::Rotations(iter) => ChannelValues::Rotation(spline_values(
                    iter.into_f32().map(Quat::from_array).collect(),
                    cubic,
                )),
                ReadOutputs::Scales(iter) => ChannelValues::Scale(spline_values(
                    iter.map(Vec3::from_array).collect(),
                    cubic,
                )),
                ReadOutputs::MorphTargetWeights(_) => continue,
            };

            keyframe_times.extend_from_slice(&times);
            channels.push(Channel {
                bone: bone.clone(),
                times,
                values,
                interpolation,
            });
        }

        let duration = keyframe_times.iter().copied().fold(0.0f32, f32::max);
        tracing::debug!(
            "Animation '{}': {} channels, {:.2}s",
            name,
            channels.len(),
            duration
        );

        clips.push(ClipDesc {
            name,
            duration,
            keyframe_times,
        });
        clip_channels.push(channels);
    }

    Ok((clips, clip_channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_matrix_is_column_major() {
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [4.0, 5.0, 6.0, 1.0],
        ];
        let flat = flatten_matrix(m);
        assert_eq!(&flat[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(&flat[..4], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cubic_spline_keeps_middle_values() {
        assert_eq!(spline_values(vec![0, 1, 2, 3, 4, 5], true), vec![1, 4]);
        assert_eq!(spline_values(vec![0, 1, 2], false), vec![0, 1, 2]);
    }
}
