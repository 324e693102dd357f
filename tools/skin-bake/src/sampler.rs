//! Animation sampling
//!
//! Drives the pose sampler through every resolved time of a clip, strictly
//! forward, and records one raw track per canonical bone.

use bake_common::{BakedTrack, BoneTransform};

use crate::error::BakeError;
use crate::hierarchy::Skeleton;
use crate::keyframes::SampleTimes;
use crate::model::PoseSampler;
use crate::session::AbortHandle;

/// Name of the synthetic bind-pose animation (always animation 0)
pub const REST_POSE_NAME: &str = "rest_pose";

/// Raw sampling result of one clip
#[derive(Debug, Clone, PartialEq)]
pub struct SampledClip {
    pub name: String,
    pub times: Vec<f32>,
    /// One track per canonical bone, each with `times.len()` samples
    pub tracks: Vec<BakedTrack>,
}

/// Single-sample animation holding every bone at its bind transform
pub fn rest_pose(skeleton: &Skeleton) -> SampledClip {
    SampledClip {
        name: REST_POSE_NAME.to_string(),
        times: vec![0.0],
        tracks: skeleton
            .bones()
            .iter()
            .map(|bone| BakedTrack::new(vec![bone.bind]))
            .collect(),
    }
}

/// Sample one clip at every resolved time
///
/// The abort flag is checked before each frame. Bones the sampler has no
/// data for keep their bind transform.
pub fn sample_clip<S: PoseSampler + ?Sized>(
    skeleton: &Skeleton,
    clip: &str,
    times: &SampleTimes,
    sampler: &mut S,
    abort: &AbortHandle,
) -> Result<SampledClip, BakeError> {
    let mut samples: Vec<Vec<BoneTransform>> = (0..skeleton.len())
        .map(|_| Vec::with_capacity(times.len()))
        .collect();

    for time in times.iter() {
        if abort.is_aborted() {
            return Err(BakeError::Aborted);
        }

        sampler.apply_pose(clip, time)?;
        for (bone, track) in skeleton.bones().iter().zip(samples.iter_mut()) {
            track.push(sampler.local_transform(&bone.name).unwrap_or(bone.bind));
        }
    }

    Ok(SampledClip {
        name: clip.to_string(),
        times: times.as_slice().to_vec(),
        tracks: samples.into_iter().map(BakedTrack::new).collect(),
    })
}
