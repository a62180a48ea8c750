//! Playback clock seen by the tick loop

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Audio transport as the tick loop sees it.
///
/// Decoding and output happen elsewhere; the loop only needs the current
/// playback time and whether audio is still running. Both are polled once
/// per tick.
pub trait Transport {
    /// Playback position in seconds, monotonically non-decreasing
    fn position(&self) -> f64;

    /// False once the track has finished or was stopped. A paused track
    /// still counts as playing.
    fn is_playing(&self) -> bool;

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn stop(&mut self) {}
}

/// Wall-clock transport for tracks played by an external audio player
#[derive(Debug, Clone, Default)]
pub struct ClockTransport {
    running_since: Option<Instant>,
    accumulated: Duration,
    duration: Option<Duration>,
    paused: bool,
    stopped: bool,
}

impl ClockTransport {
    /// Clock that runs until stopped
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that finishes by itself after `duration`
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Starts (or restarts) the clock from zero
    pub fn start(&mut self) {
        self.running_since = Some(Instant::now());
        self.accumulated = Duration::ZERO;
        self.paused = false;
        self.stopped = false;
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn started(&self) -> bool {
        self.running_since.is_some() || self.paused
    }
}

impl Transport for ClockTransport {
    fn position(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    fn is_playing(&self) -> bool {
        !self.stopped
            && self.started()
            && self.duration.is_none_or(|duration| self.elapsed() < duration)
    }

    fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        if self.paused && !self.stopped {
            self.running_since = Some(Instant::now());
            self.paused = false;
        }
    }

    fn stop(&mut self) {
        self.pause();
        self.paused = false;
        self.stopped = true;
    }
}

/// Transport whose time advances only when told to.
///
/// Each `position()` query moves the clock forward by `step`, so a tick
/// loop driven by it walks the track deterministically.
#[derive(Debug, Clone)]
pub struct SteppedTransport {
    time: Cell<f64>,
    step: f64,
    end: f64,
    paused: bool,
    stopped: bool,
}

impl SteppedTransport {
    pub fn new(step: f64, end: f64) -> Self {
        Self {
            time: Cell::new(0.0),
            step,
            end,
            paused: false,
            stopped: false,
        }
    }

    /// Time the next query will report
    pub fn peek(&self) -> f64 {
        self.time.get()
    }
}

impl Transport for SteppedTransport {
    fn position(&self) -> f64 {
        let now = self.time.get();
        if !self.paused {
            self.time.set(now + self.step);
        }
        now
    }

    fn is_playing(&self) -> bool {
        !self.stopped && self.time.get() <= self.end
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
