//! Integration tests for the skin-bake command line
//!
//! Tests the full flow: generate GLB -> run skin-bake -> verify output

mod gltf_generator;

use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

// Helper to run skin-bake with arguments
fn skin_bake(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_skin-bake"))
        .args(args)
        .output()
        .expect("Failed to run skin-bake")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("Non UTF-8 temp path")
}

#[test]
fn test_bake_and_inspect_json() {
    let dir = tempdir().expect("Failed to create temp dir");
    let glb = gltf_generator::write_skinned_glb(dir.path(), "hero");
    let artifact = dir.path().join("hero.skbake");

    let out = skin_bake(&["bake", path_str(&glb), "--lods", "2"]);
    assert!(out.status.success(), "bake failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(artifact.exists(), "Default output should sit next to the input");

    let out = skin_bake(&["inspect", path_str(&artifact), "--json"]);
    assert!(out.status.success(), "inspect failed");
    let summary: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("inspect --json should print JSON");

    assert_eq!(summary["bones"], gltf_generator::BONE_COUNT);
    assert_eq!(summary["tracks"], gltf_generator::EXPECTED_TRACKS);
    assert_eq!(summary["lod_count"], 2);
    assert_eq!(summary["animations"][0]["name"], "rest_pose");
    assert_eq!(summary["meshes"][1]["name"], "hero_skin0_LOD1");
}

#[test]
fn test_build_from_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    gltf_generator::write_skinned_glb(dir.path(), "hero");
    let manifest = dir.path().join("bake.toml");
    std::fs::write(
        &manifest,
        r#"
[bake]
input = "hero.glb"
output = "build/knight.skbake"
name = "knight"
lod_count = 2
clips = ["idle"]

[[bones]]
name = "arm"
lod = 0
"#,
    )
    .unwrap();

    let out = skin_bake(&["check", path_str(&manifest)]);
    assert!(out.status.success(), "check failed");

    let out = skin_bake(&["build", path_str(&manifest)]);
    assert!(out.status.success(), "build failed: {}", String::from_utf8_lossy(&out.stderr));

    let bytes = std::fs::read(dir.path().join("build/knight.skbake")).expect("Artifact missing");
    let asset = bake_common::read_baked_asset(&bytes).expect("Artifact unreadable");
    assert_eq!(asset.animations.len(), 2);
    assert_eq!(asset.animations[1].name, "idle");
    assert_eq!(asset.bones[1].lod_mask, 0b01);
    assert_eq!(asset.meshes[0].name, "knight_skin0_LOD0");
}

#[test]
fn test_check_rejects_invalid_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    let manifest = dir.path().join("bake.toml");
    std::fs::write(
        &manifest,
        "[bake]\ninput = \"hero.glb\"\noutput = \"hero.skbake\"\nlod_count = 12\n",
    )
    .unwrap();

    let out = skin_bake(&["check", path_str(&manifest)]);
    assert!(!out.status.success());
}

#[test]
fn test_inspect_rejects_corrupt_artifact() {
    let dir = tempdir().expect("Failed to create temp dir");
    let artifact = dir.path().join("broken.skbake");
    std::fs::write(&artifact, [1u8, 0, 1]).unwrap();

    let out = skin_bake(&["inspect", path_str(&artifact)]);
    assert!(!out.status.success());
}
