//! Rate limiting of motion curves
//!
//! A servo needs time to travel between positions. The filter keeps only
//! position changes that happen at least `min_dwell` seconds after the
//! previously accepted change, and holds the last accepted value in between.
//! The output has exactly the input's sample count and timestamp grid.

use std::time::Duration;
use crate::curve::{MotionCurve, Sample};

/// Default minimum time between accepted movements (ms)
pub const DEFAULT_MIN_DWELL_MS: u64 = 150;

/// Slew-rate limiting transform, `MotionCurve → MotionCurve`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitFilter {
    min_dwell: f64,
}

impl RateLimitFilter {
    /// Creates a filter with a minimum dwell in seconds.
    /// Zero, negative and NaN dwells all mean "no suppression".
    pub fn new(min_dwell_secs: f64) -> Self {
        let min_dwell = if min_dwell_secs > 0.0 { min_dwell_secs } else { 0.0 };
        Self { min_dwell }
    }

    pub fn from_millis(min_dwell_ms: u64) -> Self {
        Self::from_duration(Duration::from_millis(min_dwell_ms))
    }

    pub fn from_duration(min_dwell: Duration) -> Self {
        Self::new(min_dwell.as_secs_f64())
    }

    pub fn min_dwell(&self) -> f64 {
        self.min_dwell
    }

    /// Accepted keyframes of `curve`.
    ///
    /// Starts with the first sample and always ends with a keyframe at the
    /// curve's final timestamp carrying the last accepted value, even when
    /// that timestamp does not satisfy the dwell.
    pub fn keyframes(&self, curve: &MotionCurve) -> Vec<Sample> {
        let samples = curve.samples();
        let first = samples[0];

        let mut keyframes = vec![first];
        let mut last_value = first.position;
        let mut last_time = first.time;

        for sample in &samples[1..] {
            if sample.position != last_value && sample.time - last_time >= self.min_dwell {
                keyframes.push(*sample);
                last_value = sample.position;
                last_time = sample.time;
            }
        }

        let end = curve.end_time();
        if last_time != end {
            keyframes.push(Sample::new(end, last_value));
        }

        keyframes
    }

    /// Applies the filter. Curves shorter than two samples pass through.
    pub fn apply(&self, curve: MotionCurve) -> MotionCurve {
        if curve.len() < 2 {
            return curve;
        }

        let keyframes = self.keyframes(&curve);

        // Step/hold re-expansion onto the original grid
        let mut current = 0;
        let samples = curve
            .samples()
            .iter()
            .map(|sample| {
                while current + 1 < keyframes.len() && keyframes[current + 1].time <= sample.time {
                    current += 1;
                }
                Sample::new(sample.time, keyframes[current].position)
            })
            .collect();

        MotionCurve::from_validated(samples)
    }
}

impl Default for RateLimitFilter {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MIN_DWELL_MS)
    }
}

/// Shorthand for `RateLimitFilter::new(min_dwell).apply(curve)`
pub fn filter(curve: MotionCurve, min_dwell: f64) -> MotionCurve {
    RateLimitFilter::new(min_dwell).apply(curve)
}
