//! Track deduplication
//!
//! Many bones repeat the same motion (very often no motion at all) across
//! clips and across each other. Tracks are pooled so each distinct motion is
//! stored once, and every animation keeps a per-bone index into the pool.

use bake_common::{BakedAnimation, BakedTrack};

use crate::sampler::SampledClip;

/// Relative tolerance under which two track components are equal
pub const TRACK_TOLERANCE: f32 = 1e-5;

/// Append-only pool of unique tracks, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct TrackPool {
    tracks: Vec<BakedTrack>,
}

impl TrackPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool a track, returning the index of the equal entry or the new one
    ///
    /// A track holding one transform throughout is stored as a single sample,
    /// so a motionless bone matches its bind-pose track.
    pub fn intern(&mut self, mut track: BakedTrack) -> u32 {
        if track.is_constant(TRACK_TOLERANCE) {
            track.samples.truncate(1);
        }

        // Linear scan: offline, and pools stay small relative to the data they save
        if let Some(index) = self
            .tracks
            .iter()
            .position(|t| t.approx_eq(&track, TRACK_TOLERANCE))
        {
            return index as u32;
        }

        self.tracks.push(track);
        (self.tracks.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[BakedTrack] {
        &self.tracks
    }

    /// Total stored samples across the pool
    pub fn sample_count(&self) -> usize {
        self.tracks.iter().map(|t| t.samples.len()).sum()
    }
}

/// Builds the track pool and the animation index clip by clip
#[derive(Debug, Clone, Default)]
pub struct TrackDeduplicator {
    pool: TrackPool,
    animations: Vec<BakedAnimation>,
    raw_tracks: usize,
}

impl TrackDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool every track of a clip, bone by bone in canonical order
    ///
    /// The raw tracks are consumed; only pooled copies survive.
    pub fn add_clip(&mut self, clip: SampledClip) {
        self.raw_tracks += clip.tracks.len();
        let track_indices = clip
            .tracks
            .into_iter()
            .map(|track| self.pool.intern(track))
            .collect();

        self.animations.push(BakedAnimation {
            name: clip.name,
            sample_times: clip.times,
            track_indices,
        });
    }

    pub fn pool(&self) -> &TrackPool {
        &self.pool
    }

    pub fn animations(&self) -> &[BakedAnimation] {
        &self.animations
    }

    /// Number of (clip, bone) tracks seen so far
    pub fn raw_track_count(&self) -> usize {
        self.raw_tracks
    }

    /// Finished track pool and animation index
    pub fn finish(self) -> (Vec<BakedTrack>, Vec<BakedAnimation>) {
        (self.pool.tracks, self.animations)
    }
}
