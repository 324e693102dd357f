//! Integration tests for the glTF import pipeline.
//!
//! Tests the complete flow:
//! 1. Generate GLB programmatically
//! 2. Load it into a bake input and pose sampler
//! 3. Bake and validate the artifact

mod gltf_generator;

use tempfile::tempdir;

use bake_common::{BoneTransform, read_baked_asset, unpack_influences};
use skin_bake::{BakeJob, BakeSession, BakeSettings, PoseSampler, load_gltf, run_job};

#[test]
fn test_load_skeleton_meshes_and_clips() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_glb(dir.path(), "hero");

    let (input, _sampler) = load_gltf(&path).expect("Failed to load GLB");

    assert_eq!(input.name, "hero");
    assert_eq!(input.bones.len(), gltf_generator::BONE_COUNT);
    assert_eq!(input.bones[0].name, "root");
    assert_eq!(input.bones[0].parent, None);
    assert_eq!(input.bones[1].name, "arm");
    assert_eq!(input.bones[1].parent.as_deref(), Some("root"));
    assert_eq!(input.bones[1].bind.position, [0.0, 1.0, 0.0]);

    assert_eq!(input.meshes.len(), 1);
    let mesh = &input.meshes[0];
    assert_eq!(mesh.name, "body");
    assert_eq!(mesh.positions.len(), 3);
    assert_eq!(mesh.bones, vec!["root".to_string(), "arm".to_string()]);
    assert_eq!(mesh.joints[1], [0, 1, 0, 0]);
    assert_eq!(mesh.bind_poses[1], gltf_generator::mat4_translate(0.0, -1.0, 0.0));
    assert!(mesh.normals.is_none());

    let names: Vec<_> = input.clips.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["wave", "idle"]);
    assert_eq!(input.clips[0].keyframe_times, vec![0.0, 0.5, 1.0]);
    assert_eq!(input.clips[0].duration, 1.0);
}

#[test]
fn test_sampler_interpolates_channels() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_glb(dir.path(), "hero");
    let (_input, mut sampler) = load_gltf(&path).expect("Failed to load GLB");

    sampler.apply_pose("wave", 0.25).unwrap();
    let arm = sampler.local_transform("arm").unwrap();
    assert!((arm.position[1] - 1.5).abs() < 1e-6, "{:?}", arm.position);
    assert_eq!(
        sampler.local_transform("root"),
        Some(BoneTransform::IDENTITY)
    );

    sampler.restore();
    assert_eq!(sampler.local_transform("arm").unwrap().position, [0.0, 1.0, 0.0]);
}

#[test]
fn test_bake_gltf_in_memory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_glb(dir.path(), "hero");
    let (input, mut sampler) = load_gltf(&path).expect("Failed to load GLB");

    let asset = BakeSession::new(BakeSettings::default())
        .bake(&input, &mut sampler)
        .expect("Bake failed");

    assert_eq!(asset.tracks.len(), gltf_generator::EXPECTED_TRACKS);
    let names: Vec<_> = asset.animations.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["rest_pose", "wave", "idle"]);

    // Root never moves; "idle" holds every bone at its bind transform
    assert_eq!(asset.animations[0].track_indices, vec![0, 1]);
    assert_eq!(asset.animations[1].track_indices, vec![0, 2]);
    assert_eq!(asset.animations[2].track_indices, vec![0, 1]);
    assert_eq!(asset.tracks[2].samples.len(), 3);

    let mesh = asset.mesh(0, 0).expect("Missing LOD0 mesh");
    assert_eq!(mesh.name, "hero_skin0_LOD0");
    let (indices, weights) = unpack_influences(&mesh.influences[1]);
    assert_eq!(&indices[..2], &[0, 1]);
    assert!((weights[1] - 0.5).abs() < 1.0 / 999.0);
}

#[test]
fn test_bake_job_writes_artifact() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_glb(dir.path(), "hero");
    let output = dir.path().join("out/hero.skbake");

    let job = BakeJob {
        name: Some("knight".to_string()),
        settings: BakeSettings {
            sample_step: Some(0.25),
            lod_count: 2,
        },
        clips: vec!["wave".to_string()],
        ..BakeJob::new(&path, &output)
    };
    let asset = run_job(&job).expect("Bake job failed");

    let bytes = std::fs::read(&output).expect("Artifact missing");
    let decoded = read_baked_asset(&bytes).expect("Artifact unreadable");
    assert_eq!(decoded, asset);

    assert_eq!(decoded.animations.len(), 2);
    assert_eq!(
        decoded.animations[1].sample_times,
        vec![0.0, 0.25, 0.5, 0.75, 1.0]
    );
    assert_eq!(decoded.meshes.len(), 2);
    assert_eq!(decoded.meshes[1].name, "knight_skin0_LOD1");
}

#[test]
fn test_bake_job_rejects_unknown_clip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = gltf_generator::write_skinned_glb(dir.path(), "hero");
    let output = dir.path().join("hero.skbake");

    let job = BakeJob {
        clips: vec!["swim".to_string()],
        ..BakeJob::new(&path, &output)
    };
    assert!(run_job(&job).is_err());
    assert!(!output.exists());
}
