//! Motion curve data model and interpolation

use serde::{Deserialize, Serialize};
use crate::error::{CurveError, CurveResult};

/// Clamps a normalized position into `[0, 1]`; NaN collapses to closed.
pub fn clamp_position(position: f64) -> f64 {
    if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    }
}

/// One curve sample, serialized as a `[time, position]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Sample {
    /// Seconds since the start of the song
    pub time: f64,
    /// Normalized position (0 = closed, 1 = open)
    pub position: f64,
}

impl Sample {
    pub fn new(time: f64, position: f64) -> Self {
        Self { time, position }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((time, position): (f64, f64)) -> Self {
        Self { time, position }
    }
}

impl From<Sample> for (f64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.time, sample.position)
    }
}

/// Time-ordered sequence of positions for one actuator channel.
///
/// Invariants, checked by [`MotionCurve::new`]:
/// - at least one sample
/// - timestamps finite and strictly increasing
/// - positions inside `[0, 1]` (finite out-of-range values are clamped)
///
/// A curve is never mutated after construction; transforms such as the
/// [`RateLimitFilter`](crate::RateLimitFilter) consume one curve and produce
/// a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MotionCurve {
    samples: Vec<Sample>,
}

impl MotionCurve {
    /// Validates and builds a curve
    pub fn new(samples: Vec<Sample>) -> CurveResult<Self> {
        if samples.is_empty() {
            return Err(CurveError::Malformed("curve has no samples".into()));
        }

        let mut samples = samples;
        let mut previous: Option<f64> = None;

        for (index, sample) in samples.iter_mut().enumerate() {
            if !sample.time.is_finite() {
                return Err(CurveError::Malformed(format!(
                    "sample {} has non-finite time {}",
                    index, sample.time
                )));
            }
            if !sample.position.is_finite() {
                return Err(CurveError::Malformed(format!(
                    "sample {} has non-finite position {}",
                    index, sample.position
                )));
            }
            if let Some(prev) = previous {
                if sample.time <= prev {
                    return Err(CurveError::Malformed(format!(
                        "timestamps not strictly increasing at sample {} ({}s after {}s)",
                        index, sample.time, prev
                    )));
                }
            }

            sample.position = clamp_position(sample.position);
            previous = Some(sample.time);
        }

        Ok(Self { samples })
    }

    /// Builds a curve from `(time, position)` pairs
    pub fn from_pairs<I>(pairs: I) -> CurveResult<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(pairs.into_iter().map(Sample::from).collect())
    }

    /// Curve that stays at one position between two instants
    pub fn constant(start: f64, end: f64, position: f64) -> CurveResult<Self> {
        Self::from_pairs([(start, position), (end, position)])
    }

    /// Skips validation; callers guarantee the invariants already hold.
    pub(crate) fn from_validated(samples: Vec<Sample>) -> Self {
        debug_assert!(!samples.is_empty());
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed curve
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Sample {
        self.samples[0]
    }

    pub fn last(&self) -> Sample {
        self.samples[self.samples.len() - 1]
    }

    pub fn start_time(&self) -> f64 {
        self.first().time
    }

    pub fn end_time(&self) -> f64 {
        self.last().time
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    pub fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.position)
    }

    /// Number of adjacent sample pairs whose positions differ
    pub fn count_changes(&self) -> usize {
        self.samples
            .windows(2)
            .filter(|pair| pair[0].position != pair[1].position)
            .count()
    }

    /// Position at `time`.
    ///
    /// Holds the first sample before the curve starts and the last sample
    /// after it ends; blends linearly between the two bracketing samples
    /// otherwise.
    pub fn position_at(&self, time: f64) -> f64 {
        let first = self.first();
        let last = self.last();

        // NaN lands here as well
        if !(time > first.time) {
            return first.position;
        }
        if time >= last.time {
            return last.position;
        }

        // first.time < time < last.time, so 1 <= upper < len
        let upper = self.samples.partition_point(|s| s.time <= time);
        let s0 = self.samples[upper - 1];
        let s1 = self.samples[upper];

        s0.position + (s1.position - s0.position) * (time - s0.time) / (s1.time - s0.time)
    }
}

impl<'de> Deserialize<'de> for MotionCurve {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let samples = Vec::<Sample>::deserialize(deserializer)?;
        MotionCurve::new(samples).map_err(serde::de::Error::custom)
    }
}
