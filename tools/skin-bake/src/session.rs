//! Bake session
//!
//! Runs the whole pipeline for one [`BakeInput`]: every validation first,
//! then sampling against the caller's [`PoseSampler`], then deduplication and
//! mesh assembly. The sampler is restored on every exit path.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bake_common::BakedAsset;
use hashbrown::HashSet;

use crate::dedup::TrackDeduplicator;
use crate::error::BakeError;
use crate::hierarchy::analyze_hierarchy;
use crate::keyframes::{SampleTimes, resolve_sample_times};
use crate::mesh::compose_meshes;
use crate::model::{BakeInput, BakeSettings, PoseSampler};
use crate::sampler::{REST_POSE_NAME, rest_pose, sample_clip};
use crate::store::ArtifactStore;

/// Cloneable abort flag, settable from any thread
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the running bake to stop before its next frame
    ///
    /// A request that arrives after the last frame is dropped when the bake ends.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Sampling clip `clip` (0-based) of `clip_count`
    Sampling { clip: usize, clip_count: usize },
    Saving,
    /// The last bake was aborted; the next bake or [`BakeSession::reset`] returns to Idle
    Aborted,
}

/// Restores the sampler when dropped
struct RestoreGuard<'a, S: PoseSampler + ?Sized> {
    sampler: &'a mut S,
}

impl<S: PoseSampler + ?Sized> Drop for RestoreGuard<'_, S> {
    fn drop(&mut self) {
        self.sampler.restore();
    }
}

/// One baking session
#[derive(Debug, Default)]
pub struct BakeSession {
    settings: BakeSettings,
    state: SessionState,
    abort: AbortHandle,
}

impl BakeSession {
    pub fn new(settings: BakeSettings) -> Self {
        Self {
            settings,
            state: SessionState::Idle,
            abort: AbortHandle::new(),
        }
    }

    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle for aborting this session from another thread
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Return to Idle and clear any pending abort
    pub fn reset(&mut self) {
        self.abort.reset();
        self.state = SessionState::Idle;
    }

    /// Bake an input into an in-memory asset
    pub fn bake<S: PoseSampler + ?Sized>(
        &mut self,
        input: &BakeInput,
        sampler: &mut S,
    ) -> Result<BakedAsset, BakeError> {
        if self.state == SessionState::Aborted {
            self.reset();
        }

        let result = self.run(input, sampler);
        self.state = match &result {
            Err(BakeError::Aborted) => {
                tracing::warn!("Bake of '{}' aborted", input.name);
                SessionState::Aborted
            }
            _ => {
                // Past the last frame there is nothing left to stop
                if self.abort.is_aborted() {
                    tracing::debug!("Ignoring abort requested after sampling '{}'", input.name);
                }
                self.abort.reset();
                SessionState::Idle
            }
        };
        result
    }

    /// Bake an input and persist it through `store`
    pub fn bake_and_save<S, St>(
        &mut self,
        input: &BakeInput,
        sampler: &mut S,
        store: &St,
        path: &Path,
    ) -> Result<BakedAsset, BakeError>
    where
        S: PoseSampler + ?Sized,
        St: ArtifactStore + ?Sized,
    {
        let asset = self.bake(input, sampler)?;

        self.state = SessionState::Saving;
        let saved = store.save(&asset, path);
        self.abort.reset();
        self.state = SessionState::Idle;
        saved?;

        tracing::info!("Saved '{}' to {}", input.name, path.display());
        Ok(asset)
    }

    fn run<S: PoseSampler + ?Sized>(
        &mut self,
        input: &BakeInput,
        sampler: &mut S,
    ) -> Result<BakedAsset, BakeError> {
        self.validate_settings()?;

        // Validation: nothing below touches the sampler
        let skeleton = analyze_hierarchy(&input.bones, self.settings.lod_count)?;
        check_clip_names(input)?;
        let clip_times = input
            .clips
            .iter()
            .map(|clip| resolve_sample_times(clip, self.settings.sample_step))
            .collect::<Result<Vec<SampleTimes>, _>>()?;
        let meshes = compose_meshes(&input.name, &skeleton, &input.meshes)?;

        tracing::info!(
            "Baking '{}': {} bones, {} clips, {} LOD levels",
            input.name,
            skeleton.len(),
            input.clips.len(),
            skeleton.lod_count()
        );

        let mut dedup = TrackDeduplicator::new();
        dedup.add_clip(rest_pose(&skeleton));

        {
            let mut guard = RestoreGuard { sampler };
            let sampler = &mut *guard.sampler;
            let clip_count = input.clips.len();
            for (index, (clip, times)) in input.clips.iter().zip(&clip_times).enumerate() {
                self.state = SessionState::Sampling {
                    clip: index,
                    clip_count,
                };
                let sampled = sample_clip(&skeleton, &clip.name, times, sampler, &self.abort)?;
                tracing::debug!(
                    "Sampled '{}': {} frames from {:.2}s to {:.2}s",
                    clip.name,
                    times.len(),
                    times.first(),
                    times.last()
                );
                dedup.add_clip(sampled);
            }
        }

        let raw_tracks = dedup.raw_track_count();
        let (tracks, animations) = dedup.finish();
        tracing::info!(
            "Deduplicated {} tracks into {} ({} meshes)",
            raw_tracks,
            tracks.len(),
            meshes.len()
        );

        Ok(BakedAsset {
            bones: skeleton.to_baked(),
            lod_count: skeleton.lod_count(),
            tracks,
            animations,
            meshes,
        })
    }

    fn validate_settings(&self) -> Result<(), BakeError> {
        if let Some(step) = self.settings.sample_step {
            if !step.is_finite() {
                return Err(BakeError::InvalidSettings(format!(
                    "sample step must be finite, got {step}"
                )));
            }
        }
        Ok(())
    }
}

/// Clip names must be unique and must not shadow the rest pose
fn check_clip_names(input: &BakeInput) -> Result<(), BakeError> {
    let mut seen = HashSet::with_capacity(input.clips.len() + 1);
    seen.insert(REST_POSE_NAME);
    for clip in &input.clips {
        if !seen.insert(clip.name.as_str()) {
            return Err(BakeError::DuplicateName {
                kind: "clip",
                name: clip.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoneDesc, ClipDesc};
    use bake_common::BoneTransform;

    /// Counts calls; aborts the given handle after `abort_after` poses
    #[derive(Default)]
    struct CountingSampler {
        poses: usize,
        restores: usize,
        abort_after: Option<(usize, AbortHandle)>,
    }

    impl PoseSampler for CountingSampler {
        fn apply_pose(&mut self, _clip: &str, _time: f32) -> Result<(), BakeError> {
            self.poses += 1;
            if let Some((after, handle)) = &self.abort_after {
                if self.poses >= *after {
                    handle.abort();
                }
            }
            Ok(())
        }

        fn local_transform(&self, _bone: &str) -> Option<BoneTransform> {
            None
        }

        fn restore(&mut self) {
            self.restores += 1;
        }
    }

    fn input() -> BakeInput {
        BakeInput {
            name: "hero".into(),
            bones: vec![BoneDesc::new("root", None), BoneDesc::new("spine", Some("root"))],
            meshes: Vec::new(),
            clips: vec![
                ClipDesc {
                    name: "idle".into(),
                    duration: 1.0,
                    keyframe_times: vec![0.0, 0.5, 1.0],
                },
                ClipDesc {
                    name: "walk".into(),
                    duration: 1.0,
                    keyframe_times: vec![0.0, 1.0],
                },
            ],
        }
    }

    #[test]
    fn test_bake_restores_sampler() {
        let mut session = BakeSession::new(BakeSettings::default());
        let mut sampler = CountingSampler::default();
        let asset = session.bake(&input(), &mut sampler).unwrap();

        assert_eq!(sampler.poses, 5);
        assert_eq!(sampler.restores, 1);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(asset.animations.len(), 3);
        assert_eq!(asset.animations[0].name, REST_POSE_NAME);
        // Nothing moves: every bone of every clip shares the identity track
        assert_eq!(asset.tracks.len(), 1);
    }

    #[test]
    fn test_duplicate_clip_names() {
        let mut bad = input();
        bad.clips[1].name = "idle".into();
        let mut shadow = input();
        shadow.clips[0].name = REST_POSE_NAME.into();

        for source in [bad, shadow] {
            let mut sampler = CountingSampler::default();
            let err = BakeSession::default().bake(&source, &mut sampler).unwrap_err();
            assert!(matches!(err, BakeError::DuplicateName { kind: "clip", .. }));
            assert_eq!(sampler.poses, 0);
        }
    }

    #[test]
    fn test_validation_precedes_sampling() {
        let mut source = input();
        source.clips[1].keyframe_times.clear();
        let mut sampler = CountingSampler::default();
        let err = BakeSession::default().bake(&source, &mut sampler).unwrap_err();
        assert!(matches!(err, BakeError::EmptyKeyframeSet { ref clip } if clip == "walk"));
        assert_eq!(sampler.poses, 0);
        assert_eq!(sampler.restores, 0);
    }

    #[test]
    fn test_abort_mid_bake() {
        let mut session = BakeSession::default();
        let mut sampler = CountingSampler {
            abort_after: Some((2, session.abort_handle())),
            ..Default::default()
        };

        let err = session.bake(&input(), &mut sampler).unwrap_err();
        assert!(matches!(err, BakeError::Aborted));
        assert_eq!(sampler.poses, 2);
        assert_eq!(sampler.restores, 1);
        assert_eq!(session.state(), &SessionState::Aborted);

        // The next bake starts clean
        sampler.abort_after = None;
        session.bake(&input(), &mut sampler).unwrap();
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(sampler.restores, 2);
    }

    /// Requests an abort while saving, then reports success
    struct AbortingStore(AbortHandle);

    impl ArtifactStore for AbortingStore {
        fn save(&self, _asset: &BakedAsset, _path: &Path) -> Result<(), BakeError> {
            self.0.abort();
            Ok(())
        }
    }

    #[test]
    fn test_abort_during_save_does_not_leak() {
        let mut session = BakeSession::default();
        let store = AbortingStore(session.abort_handle());
        let mut sampler = CountingSampler::default();

        session
            .bake_and_save(&input(), &mut sampler, &store, Path::new("hero.skbake"))
            .unwrap();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(!session.abort_handle().is_aborted());

        // The next bake runs to completion
        session.bake(&input(), &mut sampler).unwrap();
        assert_eq!(sampler.poses, 10);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_abort_after_last_frame_does_not_leak() {
        let mut session = BakeSession::default();
        // 5 poses in total: the abort lands on the last frame
        let mut sampler = CountingSampler {
            abort_after: Some((5, session.abort_handle())),
            ..Default::default()
        };

        session.bake(&input(), &mut sampler).unwrap();
        assert!(!session.abort_handle().is_aborted());

        sampler.abort_after = None;
        session.bake(&input(), &mut sampler).unwrap();
        assert_eq!(sampler.poses, 10);
    }

    #[test]
    fn test_non_finite_step_rejected() {
        let mut session = BakeSession::new(BakeSettings {
            sample_step: Some(f32::NAN),
            lod_count: 1,
        });
        let mut sampler = CountingSampler::default();
        assert!(matches!(
            session.bake(&input(), &mut sampler),
            Err(BakeError::InvalidSettings(_))
        ));
    }
}
