//! Servo calibration

use serde::{Deserialize, Serialize};
use cantor_core::{ChannelId, clamp_position};
use crate::error::{ActuatorError, ActuatorResult};

fn default_min_pulse() -> f64 {
    500.0
}

fn default_max_pulse() -> f64 {
    1200.0
}

fn default_closed_angle() -> f64 {
    0.0
}

fn default_open_angle() -> f64 {
    60.0
}

/// Calibration of one servo channel.
///
/// Defaults match an SG90 driven between 500 and 1200 µs (roughly 0–60°).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Channel id used by motion curves
    #[serde(rename = "name")]
    pub channel_id: ChannelId,
    /// Physical PWM output driving this servo
    pub pwm_channel: u32,
    /// Pulse width at the closed end (µs)
    #[serde(default = "default_min_pulse")]
    pub min_pulse_us: f64,
    /// Pulse width at the open end (µs)
    #[serde(default = "default_max_pulse")]
    pub max_pulse_us: f64,
    /// Mouth closed (degrees)
    #[serde(default = "default_closed_angle")]
    pub closed_angle_deg: f64,
    /// Mouth open (degrees)
    #[serde(default = "default_open_angle")]
    pub open_angle_deg: f64,
}

impl ActuatorConfig {
    /// Default calibration on the given output
    pub fn new(channel_id: impl Into<ChannelId>, pwm_channel: u32) -> Self {
        Self {
            channel_id: channel_id.into(),
            pwm_channel,
            min_pulse_us: default_min_pulse(),
            max_pulse_us: default_max_pulse(),
            closed_angle_deg: default_closed_angle(),
            open_angle_deg: default_open_angle(),
        }
    }

    pub fn with_pulse_range(mut self, min_pulse_us: f64, max_pulse_us: f64) -> Self {
        self.min_pulse_us = min_pulse_us;
        self.max_pulse_us = max_pulse_us;
        self
    }

    pub fn with_angles(mut self, closed_angle_deg: f64, open_angle_deg: f64) -> Self {
        self.closed_angle_deg = closed_angle_deg;
        self.open_angle_deg = open_angle_deg;
        self
    }

    /// Rejects non-finite values and inverted pulse ranges
    pub fn validate(&self) -> ActuatorResult<()> {
        let values = [
            self.min_pulse_us,
            self.max_pulse_us,
            self.closed_angle_deg,
            self.open_angle_deg,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ActuatorError::InvalidConfig(format!(
                "channel '{}' has non-finite calibration values",
                self.channel_id
            )));
        }
        if self.min_pulse_us < 0.0 || self.min_pulse_us > self.max_pulse_us {
            return Err(ActuatorError::InvalidConfig(format!(
                "channel '{}': pulse range {}-{}µs is invalid",
                self.channel_id, self.min_pulse_us, self.max_pulse_us
            )));
        }
        Ok(())
    }

    /// `open_angle - closed_angle`
    pub fn angle_range(&self) -> f64 {
        self.open_angle_deg - self.closed_angle_deg
    }

    /// Angle for a normalized position (position clamped first)
    pub fn angle_for(&self, position: f64) -> f64 {
        self.closed_angle_deg + clamp_position(position) * self.angle_range()
    }

    /// Pulse width for an angle, clamped to the calibrated range.
    ///
    /// The angle is measured from the closed angle:
    /// `min + ((angle - closed) / (open - closed)) * (max - min)`, which is
    /// `angle / range` when `closed_angle_deg` is 0 and keeps
    /// `pulse_for(p)` linear in `p` for any closed angle.
    /// A zero angle range pins the servo at `min_pulse_us`.
    pub fn pulse_for_angle(&self, angle: f64) -> f64 {
        let range = self.angle_range();
        let pulse = if range == 0.0 {
            self.min_pulse_us
        } else {
            let span = self.max_pulse_us - self.min_pulse_us;
            self.min_pulse_us + ((angle - self.closed_angle_deg) / range) * span
        };
        pulse.max(self.min_pulse_us).min(self.max_pulse_us)
    }

    /// Pulse width for a normalized position
    pub fn pulse_for(&self, position: f64) -> f64 {
        self.pulse_for_angle(self.angle_for(position))
    }

    /// Pulse width of the closed mouth
    pub fn closed_pulse(&self) -> f64 {
        self.pulse_for(0.0)
    }
}
