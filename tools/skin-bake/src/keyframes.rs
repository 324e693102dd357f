//! Sample time resolution
//!
//! Decides at which times each clip is sampled. Uniform source data is kept
//! as authored; anything else is snapped to a fixed-point grid.

use crate::error::BakeError;
use crate::model::ClipDesc;

/// Default sample rate for unevenly keyed clips (frames per second)
pub const DEFAULT_SAMPLE_RATE: f32 = 30.0;

/// Maximum deviation from the first delta for keys to count as evenly spaced (seconds)
pub const EVEN_SPACING_TOLERANCE: f32 = 1e-3;

/// Keys closer than this are the same key (seconds)
const DISTINCT_EPSILON: f32 = 1e-6;

/// Fixed-point grid resolution: times are quantized to 2 decimals
const TICKS_PER_SECOND: f32 = 100.0;

/// Strictly increasing, non-empty list of sample times in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTimes(Vec<f32>);

impl SampleTimes {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resolved times are never empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> f32 {
        self.0[0]
    }

    pub fn last(&self) -> f32 {
        self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

/// Resolve the sample times of a clip
///
/// In priority order:
/// 1. a single distinct key is sampled once
/// 2. a forced step (> 0) enumerates `min + k * step` on the 2-decimal grid
/// 3. evenly spaced keys are used as-is
/// 4. otherwise the [`DEFAULT_SAMPLE_RATE`] grid is enumerated
///
/// Grid enumeration stops at the last multiple not past the final key; a
/// trailing partial interval is dropped.
pub fn resolve_sample_times(
    clip: &ClipDesc,
    forced_step: Option<f32>,
) -> Result<SampleTimes, BakeError> {
    if clip.keyframe_times.is_empty() {
        return Err(BakeError::EmptyKeyframeSet {
            clip: clip.name.clone(),
        });
    }
    if let Some(t) = clip.keyframe_times.iter().find(|t| !t.is_finite()) {
        return Err(BakeError::InvalidClip {
            clip: clip.name.clone(),
            reason: format!("non-finite keyframe time {t}"),
        });
    }

    let mut times = clip.keyframe_times.clone();
    times.sort_by(f32::total_cmp);
    times.dedup_by(|a, b| (*a - *b).abs() <= DISTINCT_EPSILON);

    let (min, max) = (times[0], times[times.len() - 1]);
    if clip.duration > 0.0 && max > clip.duration + EVEN_SPACING_TOLERANCE {
        tracing::warn!(
            "Clip '{}' has keys up to {:.3}s past its {:.3}s duration",
            clip.name,
            max,
            clip.duration
        );
    }

    if times.len() == 1 {
        return Ok(SampleTimes(times));
    }

    if let Some(step) = forced_step.filter(|&s| s > 0.0) {
        tracing::debug!("Clip '{}': forced step {}s", clip.name, step);
        return Ok(SampleTimes(grid_times(min, max, step)));
    }

    if is_evenly_spaced(&times) {
        tracing::debug!("Clip '{}': {} evenly spaced keys", clip.name, times.len());
        return Ok(SampleTimes(times));
    }

    tracing::debug!(
        "Clip '{}': uneven keys, resampling at {} fps",
        clip.name,
        DEFAULT_SAMPLE_RATE
    );
    Ok(SampleTimes(grid_times(min, max, 1.0 / DEFAULT_SAMPLE_RATE)))
}

/// Whether every delta between sorted keys matches the first within tolerance
fn is_evenly_spaced(times: &[f32]) -> bool {
    let first = times[1] - times[0];
    times
        .windows(2)
        .all(|w| ((w[1] - w[0]) - first).abs() <= EVEN_SPACING_TOLERANCE)
}

#[inline]
fn to_ticks(seconds: f32) -> i64 {
    (seconds * TICKS_PER_SECOND).round() as i64
}

/// Enumerate `min + k * step` on the fixed-point grid, up to and including `max`
fn grid_times(min: f32, max: f32, step: f32) -> Vec<f32> {
    let start = to_ticks(min);
    let end = to_ticks(max);
    let step = to_ticks(step).max(1);

    let mut times = Vec::with_capacity(((end - start) / step + 1) as usize);
    let mut tick = start;
    while tick <= end {
        times.push(tick as f32 / TICKS_PER_SECOND);
        tick += step;
    }
    times
}
