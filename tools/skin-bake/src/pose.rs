//! Keyframe channel pose sampler
//!
//! A [`PoseSampler`] over plain keyframe channels. The glTF adapter builds one
//! from a document; editor integrations or tests can build one directly.

use bake_common::BoneTransform;
use glam::{Quat, Vec3};
use hashbrown::HashMap;

use crate::error::BakeError;
use crate::model::PoseSampler;

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Keyframe values of one channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl ChannelValues {
    fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }
}

/// One animated property of one bone
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub bone: String,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

impl Channel {
    /// Apply this channel's value at `time` to a transform
    fn apply(&self, time: f32, transform: &mut BoneTransform) {
        let Some((i, factor)) = keyframe_segment(&self.times, time, self.interpolation) else {
            return;
        };
        match &self.values {
            ChannelValues::Translation(v) => {
                transform.position = lerp_at(v, i, factor).to_array();
            }
            ChannelValues::Scale(v) => {
                transform.scale = lerp_at(v, i, factor).to_array();
            }
            ChannelValues::Rotation(v) => {
                let q = if i + 1 < v.len() {
                    v[i].slerp(v[i + 1], factor)
                } else {
                    v[i]
                };
                transform.rotation = q.normalize().to_array();
            }
        }
    }
}

/// Find the keyframe segment for `time`: (start key, interpolation factor)
fn keyframe_segment(times: &[f32], time: f32, interpolation: Interpolation) -> Option<(usize, f32)> {
    if times.is_empty() {
        return None;
    }

    let mut i = 0;
    while i < times.len() - 1 && times[i + 1] <= time {
        i += 1;
    }

    if i >= times.len() - 1 || time <= times[0] {
        return Some((if time <= times[0] { 0 } else { i }, 0.0));
    }

    let (t0, t1) = (times[i], times[i + 1]);
    let factor = match interpolation {
        Interpolation::Step => 0.0,
        Interpolation::Linear if t1 > t0 => ((time - t0) / (t1 - t0)).clamp(0.0, 1.0),
        Interpolation::Linear => 0.0,
    };
    Some((i, factor))
}

fn lerp_at(values: &[Vec3], i: usize, factor: f32) -> Vec3 {
    if i + 1 < values.len() {
        values[i].lerp(values[i + 1], factor)
    } else {
        values[i]
    }
}

/// Pose sampler over keyframe channels, grouped by clip
///
/// Enforces forward-only sampling within a clip: a time earlier than the
/// previously applied time of the same clip is rejected.
#[derive(Debug, Clone, Default)]
pub struct ChannelPoseSampler {
    bind: HashMap<String, BoneTransform>,
    clips: HashMap<String, Vec<Channel>>,
    pose: HashMap<String, BoneTransform>,
    applied: Option<(String, f32)>,
}

impl ChannelPoseSampler {
    /// Create a sampler from bind transforms by bone name
    pub fn new(bind: impl IntoIterator<Item = (String, BoneTransform)>) -> Self {
        let bind: HashMap<_, _> = bind.into_iter().collect();
        Self {
            pose: bind.clone(),
            bind,
            clips: HashMap::new(),
            applied: None,
        }
    }

    /// Register the channels of a clip
    ///
    /// Channels with mismatched key/value counts are skipped with a warning.
    pub fn add_clip(&mut self, name: impl Into<String>, channels: Vec<Channel>) {
        let name = name.into();
        let channels = channels
            .into_iter()
            .filter(|c| {
                let ok = !c.times.is_empty() && c.times.len() == c.values.len();
                if !ok {
                    tracing::warn!(
                        "Clip '{}': ignoring channel on '{}' with {} keys and {} values",
                        name,
                        c.bone,
                        c.times.len(),
                        c.values.len()
                    );
                }
                ok
            })
            .collect();
        self.clips.insert(name, channels);
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Currently applied (clip, time), if any
    pub fn applied(&self) -> Option<(&str, f32)> {
        self.applied.as_ref().map(|(c, t)| (c.as_str(), *t))
    }
}

impl PoseSampler for ChannelPoseSampler {
    fn apply_pose(&mut self, clip: &str, time: f32) -> Result<(), BakeError> {
        let channels = self.clips.get(clip).ok_or_else(|| BakeError::Sampler {
            clip: clip.to_string(),
            time,
            reason: "unknown clip".to_string(),
        })?;

        if let Some((current, last)) = &self.applied {
            if current == clip && time < *last {
                return Err(BakeError::Sampler {
                    clip: clip.to_string(),
                    time,
                    reason: format!("backward seek from {last}s"),
                });
            }
        }

        self.pose.clone_from(&self.bind);
        for channel in channels {
            let transform = self
                .pose
                .entry(channel.bone.clone())
                .or_insert(BoneTransform::IDENTITY);
            channel.apply(time, transform);
        }
        self.applied = Some((clip.to_string(), time));
        Ok(())
    }

    fn local_transform(&self, bone: &str) -> Option<BoneTransform> {
        self.pose.get(bone).copied()
    }

    fn restore(&mut self) {
        self.pose.clone_from(&self.bind);
        self.applied = None;
    }
}
