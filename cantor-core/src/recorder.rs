//! Manual movement recording
//!
//! An alternative curve producer: a performer holds a key while the song
//! plays, and the press/release stream becomes a binary open/closed curve.
//! The recorder is a small state machine fed with time-stamped events.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::curve::MotionCurve;
use crate::error::{CurveError, CurveResult};

/// Sampling rate of rendered recordings (Hz)
pub const DEFAULT_RECORD_RATE_HZ: f64 = 50.0;

/// Longest recording that can be rendered (seconds)
pub const MAX_RECORDING_SECONDS: f64 = 3600.0;

/// Key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    /// Mouth opens
    Press,
    /// Mouth closes
    Release,
}

/// Time-stamped key transition (seconds since the song started)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub time: f64,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn press(time: f64) -> Self {
        Self { time, action: KeyAction::Press }
    }

    pub fn release(time: f64) -> Self {
        Self { time, action: KeyAction::Release }
    }
}

/// Press/release recorder
#[derive(Debug, Clone)]
pub struct MovementRecorder {
    /// Accepted events, alternating press/release
    events: Vec<KeyEvent>,
    held: bool,
    sample_rate_hz: f64,
}

impl MovementRecorder {
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_RECORD_RATE_HZ)
    }

    pub fn with_sample_rate(sample_rate_hz: f64) -> Self {
        Self {
            events: Vec::new(),
            held: false,
            sample_rate_hz: if sample_rate_hz > 0.0 { sample_rate_hz } else { DEFAULT_RECORD_RATE_HZ },
        }
    }

    /// Feeds one event. Returns `false` when the event is ignored: a press
    /// while already held, a release while not held, or an event older than
    /// the previous accepted one.
    pub fn handle(&mut self, event: KeyEvent) -> bool {
        if !event.time.is_finite() || event.time < 0.0 {
            warn!(time = event.time, "ignoring key event with invalid time");
            return false;
        }
        if let Some(last) = self.events.last() {
            if event.time < last.time {
                warn!(time = event.time, last = last.time, "ignoring out-of-order key event");
                return false;
            }
        }

        let accepted = match event.action {
            KeyAction::Press if !self.held => {
                self.held = true;
                true
            }
            KeyAction::Release if self.held => {
                self.held = false;
                true
            }
            _ => false,
        };

        if accepted {
            debug!(time = event.time, action = ?event.action, "key event recorded");
            self.events.push(event);
        }
        accepted
    }

    /// Feeds a whole event stream
    pub fn record<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        events.into_iter().filter(|e| self.handle(*e)).count()
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.held = false;
    }

    /// Whether the key is down at `time`
    fn is_open_at(&self, time: f64) -> bool {
        let mut open = false;
        for event in &self.events {
            if event.time > time {
                break;
            }
            open = event.action == KeyAction::Press;
        }
        open
    }

    /// Renders the recording as a binary curve over `[0, duration]`.
    /// Without events the curve stays closed.
    pub fn to_curve(&self, duration: f64) -> CurveResult<MotionCurve> {
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(CurveError::Malformed(format!("invalid recording duration {}", duration)));
        }
        if duration > MAX_RECORDING_SECONDS {
            return Err(CurveError::Malformed(format!(
                "recording duration {} s exceeds {} s",
                duration, MAX_RECORDING_SECONDS
            )));
        }

        if self.events.is_empty() {
            warn!("no key events recorded");
            return MotionCurve::constant(0.0, duration, 0.0);
        }

        let count = ((duration * self.sample_rate_hz) as usize).max(2);
        let step = duration / (count - 1) as f64;

        let pairs = (0..count).map(|i| {
            let time = if i + 1 == count { duration } else { i as f64 * step };
            let position = if self.is_open_at(time) { 1.0 } else { 0.0 };
            (time, position)
        });

        MotionCurve::from_pairs(pairs)
    }
}

impl Default for MovementRecorder {
    fn default() -> Self {
        Self::new()
    }
}
