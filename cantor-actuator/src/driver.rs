//! Actuator driver contract

use cantor_core::{ChannelId, ChannelMap};
use crate::config::ActuatorConfig;
use crate::error::ActuatorResult;

/// Sink for normalized mouth positions.
///
/// Implemented by [`HardwareDriver`](crate::HardwareDriver) and
/// [`MockDriver`](crate::MockDriver). All calls run on the tick path and
/// must return in well under a tick interval.
///
/// The driver owns each channel's state; its only writer is whoever holds
/// `&mut self`, so no locking is involved.
pub trait ActuatorDriver: Send {
    /// Short label for logs (`"hardware"`, `"mock"`)
    fn kind(&self) -> &'static str;

    /// Attaches the configured channels and closes every mouth
    fn initialize(&mut self, configs: &[ActuatorConfig]) -> ActuatorResult<()>;

    /// Applies one batch of positions.
    ///
    /// Positions are clamped to `[0, 1]`. Channels without configuration
    /// are skipped with a warning. A failing channel does not stop the
    /// others; the first failure is returned after the whole batch ran.
    fn set_positions(&mut self, positions: &ChannelMap<f64>) -> ActuatorResult<()>;

    /// Closes every mouth and releases the outputs. Idempotent.
    fn shutdown(&mut self) -> ActuatorResult<()>;

    /// Whether `channel` is configured on this driver
    fn has_channel(&self, channel: &ChannelId) -> bool;

    /// Configured channels, sorted
    fn channels(&self) -> Vec<ChannelId>;

    /// Last position applied to `channel`
    fn position(&self, channel: &ChannelId) -> Option<f64>;

    /// Sets every configured channel to closed
    fn close_all(&mut self) -> ActuatorResult<()> {
        let positions: ChannelMap<f64> = self
            .channels()
            .into_iter()
            .map(|channel| (channel, 0.0))
            .collect();
        self.set_positions(&positions)
    }

    /// Convenience for a single channel
    fn set_position(&mut self, channel: &ChannelId, position: f64) -> ActuatorResult<()> {
        let mut positions = ChannelMap::with_capacity(1);
        positions.insert(channel.clone(), position);
        self.set_positions(&positions)
    }
}
