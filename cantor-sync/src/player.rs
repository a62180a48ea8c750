//! Synchronised player: curves in, batched positions out

use std::fmt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use cantor_actuator::{ActuatorDriver, ActuatorError};
use cantor_core::{ChannelId, ChannelMap, MotionCurve};

use crate::error::{SyncError, SyncResult};

/// Player lifecycle.
///
/// ```text
/// Idle ─load→ Loaded ─play→ Playing ⇄ Paused
///                               │         │
///                               └─stop────┴─→ Stopped ─load→ Loaded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Idle,
    Loaded,
    Playing,
    Paused,
    Stopped,
}

impl PlayerState {
    /// Playing or paused: the actuators may be away from closed
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Idle => "idle",
            PlayerState::Loaded => "loaded",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Curves of the song being played and the time cursor
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    loaded_curves: ChannelMap<MotionCurve>,
    is_playing: bool,
    cursor: Option<f64>,
}

impl PlaybackSession {
    fn new(loaded_curves: ChannelMap<MotionCurve>) -> Self {
        Self {
            loaded_curves,
            is_playing: false,
            cursor: None,
        }
    }

    pub fn curves(&self) -> &ChannelMap<MotionCurve> {
        &self.loaded_curves
    }

    pub fn curve(&self, channel: &ChannelId) -> Option<&MotionCurve> {
        self.loaded_curves.get(channel)
    }

    /// Loaded channels, sorted
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self.loaded_curves.keys().cloned().collect();
        channels.sort();
        channels
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Time of the last dispatched tick
    pub fn cursor(&self) -> Option<f64> {
        self.cursor
    }

    /// Latest end time among the loaded curves
    pub fn end_time(&self) -> f64 {
        self.loaded_curves
            .values()
            .map(MotionCurve::end_time)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Every loaded channel sampled at the same instant
    pub fn positions_at(&self, time: f64) -> ChannelMap<f64> {
        self.loaded_curves
            .iter()
            .map(|(channel, curve)| (channel.clone(), curve.position_at(time)))
            .collect()
    }
}

/// Outcome of [`SyncPlayer::load`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Channels accepted, sorted
    pub loaded: Vec<ChannelId>,
    /// Channels without a configured actuator, sorted
    pub skipped: Vec<ChannelId>,
}

/// Drives one [`ActuatorDriver`] from a set of motion curves.
///
/// The player is the driver's only writer. Each [`tick`](Self::tick)
/// samples every channel at the same time and hands the whole batch to the
/// driver in one call.
pub struct SyncPlayer<D: ActuatorDriver> {
    driver: D,
    state: PlayerState,
    session: Option<PlaybackSession>,
    ticks: u64,
}

impl<D: ActuatorDriver> fmt::Debug for SyncPlayer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPlayer")
            .field("driver", &self.driver.kind())
            .field("state", &self.state)
            .field("channels", &self.session.as_ref().map(PlaybackSession::channels))
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl<D: ActuatorDriver> SyncPlayer<D> {
    /// Player over an initialized driver
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: PlayerState::Idle,
            session: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Ticks dispatched since the last load
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Loads the curves of one song.
    ///
    /// Channels the driver does not know are logged and skipped. Loading
    /// while active stops the running session first.
    pub fn load(&mut self, channel_curves: ChannelMap<MotionCurve>) -> SyncResult<LoadReport> {
        if self.state.is_active() {
            if let Err(err) = self.stop() {
                warn!(%err, "reset before load did not complete cleanly");
            }
        }

        if channel_curves.is_empty() {
            return Err(SyncError::MissingData("no motion curves to load".into()));
        }

        let mut report = LoadReport::default();
        let mut accepted = ChannelMap::with_capacity(channel_curves.len());
        for (channel, curve) in channel_curves {
            if self.driver.has_channel(&channel) {
                report.loaded.push(channel.clone());
                accepted.insert(channel, curve);
            } else {
                let err = ActuatorError::ConfigMismatch(channel.clone());
                warn!(%channel, %err, "skipping channel");
                report.skipped.push(channel);
            }
        }
        report.loaded.sort();
        report.skipped.sort();

        if accepted.is_empty() {
            return Err(SyncError::MissingData(
                "none of the curves matches a configured actuator".into(),
            ));
        }

        info!(
            channels = report.loaded.len(),
            skipped = report.skipped.len(),
            driver = self.driver.kind(),
            "curves loaded"
        );
        self.session = Some(PlaybackSession::new(accepted));
        self.state = PlayerState::Loaded;
        self.ticks = 0;
        Ok(report)
    }

    pub fn play(&mut self) -> SyncResult<()> {
        self.transition("play", PlayerState::Loaded, PlayerState::Playing)
    }

    pub fn pause(&mut self) -> SyncResult<()> {
        self.transition("pause", PlayerState::Playing, PlayerState::Paused)
    }

    pub fn resume(&mut self) -> SyncResult<()> {
        self.transition("resume", PlayerState::Paused, PlayerState::Playing)
    }

    fn transition(&mut self, action: &str, from: PlayerState, to: PlayerState) -> SyncResult<()> {
        if self.state != from {
            return Err(SyncError::InvalidState(format!(
                "cannot {} while {}",
                action, self.state
            )));
        }
        if let Some(session) = self.session.as_mut() {
            session.is_playing = to == PlayerState::Playing;
        }
        debug!(%from, %to, "player state");
        self.state = to;
        Ok(())
    }

    /// Samples every channel at `current_time` and dispatches the batch.
    ///
    /// Returns whether anything was dispatched: outside `Playing` the call
    /// does nothing. Driver failures are logged, never raised.
    pub fn tick(&mut self, current_time: f64) -> bool {
        if self.state != PlayerState::Playing {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let positions = session.positions_at(current_time);
        session.cursor = Some(current_time);
        self.ticks += 1;

        if let Err(err) = self.driver.set_positions(&positions) {
            warn!(time = current_time, %err, "dispatch incomplete");
        }
        true
    }

    /// Positions a tick at `time` would dispatch, without dispatching
    pub fn positions_at(&self, time: f64) -> ChannelMap<f64> {
        self.session
            .as_ref()
            .map(|session| session.positions_at(time))
            .unwrap_or_default()
    }

    /// Closes every loaded channel and ends the session.
    ///
    /// Always ends in `Stopped`, even when the driver reports a failure;
    /// that failure is returned afterwards.
    pub fn stop(&mut self) -> SyncResult<()> {
        let result = match self.session.take() {
            Some(session) => {
                let closed: ChannelMap<f64> = session
                    .loaded_curves
                    .into_keys()
                    .map(|channel| (channel, 0.0))
                    .collect();
                self.driver.set_positions(&closed).map_err(SyncError::from)
            }
            None => Ok(()),
        };

        if self.state != PlayerState::Stopped {
            info!(ticks = self.ticks, "playback stopped, mouths closed");
        }
        self.state = PlayerState::Stopped;
        result
    }

    /// Stops and shuts the driver down
    pub fn shutdown(&mut self) -> SyncResult<()> {
        let stopped = self.stop();
        self.driver.shutdown()?;
        stopped
    }
}

impl<D: ActuatorDriver> Drop for SyncPlayer<D> {
    fn drop(&mut self) {
        if self.state.is_active() {
            let _ = self.stop();
        }
    }
}
