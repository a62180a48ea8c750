//! Tick cadence for the playback loop

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

/// Default tick interval (100 Hz)
pub const DEFAULT_TICK_MS: u64 = 10;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between ticks
    pub tick: Duration,
    /// Execution mode
    pub mode: SchedulerMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            mode: SchedulerMode::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_tick_ms(tick_ms: u64) -> Self {
        Self {
            tick: Duration::from_millis(tick_ms.max(1)),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: SchedulerMode) -> Self {
        self.mode = mode;
        self
    }
}

/// How the scheduler waits between ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    /// Ticks land on a fixed grid; a late tick does not shift the next one
    #[default]
    FixedRate,
    /// Always waits a full interval after the previous tick
    FixedDelay,
    /// No waiting at all
    BestEffort,
}

/// Paces the tick loop and keeps timing statistics
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    first_tick: Option<Instant>,
    next_deadline: Option<Instant>,
    last_tick: Option<Instant>,
    tick_count: u64,
    missed_ticks: u64,
    executed: u64,
    total_execution_time: Duration,
    min_execution_time: Option<Duration>,
    max_execution_time: Option<Duration>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            first_tick: None,
            next_deadline: None,
            last_tick: None,
            tick_count: 0,
            missed_ticks: 0,
            executed: 0,
            total_execution_time: Duration::ZERO,
            min_execution_time: None,
            max_execution_time: None,
        }
    }

    pub fn with_tick_ms(tick_ms: u64) -> Self {
        Self::new(SchedulerConfig::from_tick_ms(tick_ms))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn target_interval(&self) -> Duration {
        self.config.tick
    }

    /// Sleeps until the next tick is due
    pub fn wait_for_next_tick(&mut self) -> TickInfo {
        let interval = self.target_interval();
        let mut on_time = true;

        match self.config.mode {
            SchedulerMode::FixedRate => {
                if let Some(deadline) = self.next_deadline {
                    let now = Instant::now();
                    if now < deadline {
                        std::thread::sleep(deadline - now);
                        self.next_deadline = Some(deadline + interval);
                    } else {
                        // whole intervals already gone by are lost, not replayed
                        let late = now.duration_since(deadline);
                        let missed = (late.as_secs_f64() / interval.as_secs_f64()) as u64;
                        if missed > 0 {
                            self.missed_ticks += missed;
                            on_time = false;
                        }
                        self.next_deadline = Some(now + interval);
                    }
                } else {
                    self.next_deadline = Some(Instant::now() + interval);
                }
            }
            SchedulerMode::FixedDelay => {
                if let Some(last) = self.last_tick {
                    let elapsed = last.elapsed();
                    if elapsed < interval {
                        std::thread::sleep(interval - elapsed);
                    }
                }
            }
            SchedulerMode::BestEffort => {}
        }

        let now = Instant::now();
        let elapsed = self.last_tick.map_or(Duration::ZERO, |last| now.duration_since(last));
        self.first_tick.get_or_insert(now);
        self.last_tick = Some(now);
        self.tick_count += 1;

        TickInfo {
            tick_number: self.tick_count,
            elapsed,
            on_time,
        }
    }

    /// Records how long one tick's work took
    pub fn record_execution_time(&mut self, duration: Duration) {
        self.executed += 1;
        self.total_execution_time += duration;
        self.min_execution_time = Some(self.min_execution_time.map_or(duration, |min| min.min(duration)));
        self.max_execution_time = Some(self.max_execution_time.map_or(duration, |max| max.max(duration)));
    }

    pub fn stats(&self) -> SchedulerStats {
        let avg_execution_time = if self.executed > 0 {
            self.total_execution_time.div_f64(self.executed as f64)
        } else {
            Duration::ZERO
        };

        let actual_rate_hz = match (self.first_tick, self.last_tick) {
            (Some(first), Some(last)) if self.tick_count > 1 => {
                let span = last.duration_since(first).as_secs_f64();
                if span > 0.0 { (self.tick_count - 1) as f64 / span } else { 0.0 }
            }
            _ => 0.0,
        };

        SchedulerStats {
            tick_count: self.tick_count,
            missed_ticks: self.missed_ticks,
            target_rate_hz: 1.0 / self.target_interval().as_secs_f64(),
            actual_rate_hz,
            avg_execution_time,
            min_execution_time: self.min_execution_time.unwrap_or(Duration::ZERO),
            max_execution_time: self.max_execution_time.unwrap_or(Duration::ZERO),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn missed_ticks(&self) -> u64 {
        self.missed_ticks
    }

    /// Less than 1% of ticks missed
    pub fn is_on_time(&self) -> bool {
        if self.tick_count == 0 {
            return true;
        }
        (self.missed_ticks as f64 / self.tick_count as f64) < 0.01
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// One tick as seen by the loop
#[derive(Debug, Clone)]
pub struct TickInfo {
    pub tick_number: u64,
    /// Time since the previous tick
    pub elapsed: Duration,
    /// False when whole intervals were skipped before this tick
    pub on_time: bool,
}

/// Timing summary of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStats {
    pub tick_count: u64,
    pub missed_ticks: u64,
    pub target_rate_hz: f64,
    pub actual_rate_hz: f64,
    pub avg_execution_time: Duration,
    pub min_execution_time: Duration,
    pub max_execution_time: Duration,
}
