//! Programmatic GLB generation for integration tests.
//!
//! Generates a GLB with:
//! - one skinned triangle weighted to "root" and "arm"
//! - 2-bone skeleton (root → arm) with inverse bind matrices
//! - "wave": arm translation keys at 0, 0.5 and 1.0s
//! - "idle": root rotation held at identity, keys at 0 and 1s

#![allow(dead_code)]

use serde_json::json;

/// Bone count for the test skeleton
pub const BONE_COUNT: usize = 2;
/// Tracks in the baked test asset: identity, arm bind, arm wave
pub const EXPECTED_TRACKS: usize = 3;

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

/// Little-endian binary buffer with one buffer view per region
#[derive(Default)]
struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<serde_json::Value>,
}

impl BufferBuilder {
    fn push_f32(&mut self, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(&bytes)
    }

    fn push_u16(&mut self, values: &[u16]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(&bytes)
    }

    fn push_u32(&mut self, values: &[u32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(&bytes)
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.data.len(),
            "byteLength": bytes.len(),
        }));
        self.data.extend_from_slice(bytes);
        self.views.len() - 1
    }
}

fn accessor(view: usize, component: u32, count: usize, kind: &str) -> serde_json::Value {
    json!({
        "bufferView": view,
        "componentType": component,
        "count": count,
        "type": kind,
    })
}

fn bounded(
    view: usize,
    count: usize,
    kind: &str,
    min: &[f32],
    max: &[f32],
) -> serde_json::Value {
    let mut value = accessor(view, FLOAT, count, kind);
    value["min"] = json!(min);
    value["max"] = json!(max);
    value
}

/// Column-major translation matrix
pub fn mat4_translate(x: f32, y: f32, z: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ]
}

/// Generate the complete test GLB
pub fn generate_skinned_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::default();

    let positions = buffer.push_f32(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let joints = buffer.push_u16(&[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0]);
    let weights = buffer.push_f32(&[
        1.0, 0.0, 0.0, 0.0, //
        0.5, 0.5, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0,
    ]);
    let indices = buffer.push_u32(&[0, 1, 2]);
    let ibm: Vec<f32> = [mat4_translate(0.0, 0.0, 0.0), mat4_translate(0.0, -1.0, 0.0)]
        .concat();
    let ibm = buffer.push_f32(&ibm);
    let wave_times = buffer.push_f32(&[0.0, 0.5, 1.0]);
    let wave_values = buffer.push_f32(&[0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0]);
    let idle_times = buffer.push_f32(&[0.0, 1.0]);
    let idle_values = buffer.push_f32(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    let root = json!({
        "asset": { "version": "2.0", "generator": "skin-bake tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2] }],
        "nodes": [
            { "name": "root", "children": [1] },
            { "name": "arm", "translation": [0.0, 1.0, 0.0] },
            { "name": "body", "mesh": 0, "skin": 0 },
        ],
        "meshes": [{
            "name": "body",
            "primitives": [{
                "attributes": { "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 },
                "indices": 3,
            }],
        }],
        "skins": [{ "joints": [0, 1], "inverseBindMatrices": 4 }],
        "animations": [
            {
                "name": "wave",
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
                "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }],
            },
            {
                "name": "idle",
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "rotation" } }],
                "samplers": [{ "input": 7, "output": 8, "interpolation": "LINEAR" }],
            },
        ],
        "accessors": [
            bounded(positions, 3, "VEC3", &[0.0, 0.0, 0.0], &[1.0, 1.0, 0.0]),
            accessor(joints, UNSIGNED_SHORT, 3, "VEC4"),
            accessor(weights, FLOAT, 3, "VEC4"),
            accessor(indices, UNSIGNED_INT, 3, "SCALAR"),
            accessor(ibm, FLOAT, BONE_COUNT, "MAT4"),
            bounded(wave_times, 3, "SCALAR", &[0.0], &[1.0]),
            accessor(wave_values, FLOAT, 3, "VEC3"),
            bounded(idle_times, 2, "SCALAR", &[0.0], &[1.0]),
            accessor(idle_values, FLOAT, 2, "VEC4"),
        ],
        "bufferViews": buffer.views,
        "buffers": [{ "byteLength": buffer.data.len() }],
    });

    assemble_glb(&root, &buffer.data)
}

/// Assemble the final GLB binary
fn assemble_glb(root: &serde_json::Value, buffer_data: &[u8]) -> Vec<u8> {
    let json_bytes = serde_json::to_vec(root).expect("Failed to serialize JSON");

    // Chunks are 4-byte aligned: JSON padded with spaces, BIN with zeros
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb.extend_from_slice(&json_bytes);
    glb.extend(std::iter::repeat_n(0x20u8, json_padding));

    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat_n(0u8, buffer_padding));

    glb
}

/// Write the test GLB to `dir/<name>.glb`
pub fn write_skinned_glb(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(format!("{name}.glb"));
    std::fs::write(&path, generate_skinned_glb()).expect("Failed to write GLB");
    path
}
