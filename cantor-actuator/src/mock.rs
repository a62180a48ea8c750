//! Mock driver: records positions instead of moving servos

use tracing::{info, warn};
use cantor_core::{ChannelId, ChannelMap, clamp_position};

use crate::config::ActuatorConfig;
use crate::driver::ActuatorDriver;
use crate::error::{ActuatorError, ActuatorResult};
use crate::state::{ActuatorState, ChannelTable};

/// Minimum position change worth a log line
pub const DEFAULT_DEADBAND: f64 = 0.1;

/// Observation-only driver.
///
/// Keeps the latest position per channel and logs a line only when a
/// channel moves by more than the deadband since its previous value, so
/// smooth interpolation does not flood the log.
#[derive(Debug, Clone)]
pub struct MockDriver {
    table: ChannelTable,
    deadband: f64,
    initialized: bool,
    batches: u64,
    logged_moves: u64,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_deadband(DEFAULT_DEADBAND)
    }

    pub fn with_deadband(deadband: f64) -> Self {
        Self {
            table: ChannelTable::default(),
            deadband: if deadband >= 0.0 { deadband } else { DEFAULT_DEADBAND },
            initialized: false,
            batches: 0,
            logged_moves: 0,
        }
    }

    /// Mock already initialized with `configs`
    pub fn with_configs(configs: &[ActuatorConfig]) -> ActuatorResult<Self> {
        let mut driver = Self::new();
        driver.initialize(configs)?;
        Ok(driver)
    }

    pub fn deadband(&self) -> f64 {
        self.deadband
    }

    pub fn state(&self, channel: &ChannelId) -> Option<&ActuatorState> {
        self.table.get(channel)
    }

    /// Latest position of every channel
    pub fn positions(&self) -> ChannelMap<f64> {
        self.table
            .iter()
            .map(|(channel, state)| (channel.clone(), state.current_position))
            .collect()
    }

    /// `set_positions` calls accepted so far
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Moves large enough to be logged
    pub fn logged_moves(&self) -> u64 {
        self.logged_moves
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorDriver for MockDriver {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn initialize(&mut self, configs: &[ActuatorConfig]) -> ActuatorResult<()> {
        self.table = ChannelTable::from_configs(configs)?;
        self.initialized = true;
        info!(channels = self.table.len(), "running in mock mode, no servo output");
        Ok(())
    }

    fn set_positions(&mut self, positions: &ChannelMap<f64>) -> ActuatorResult<()> {
        if !self.initialized {
            return Err(ActuatorError::NotInitialized);
        }

        for (channel, &position) in positions {
            let Some(state) = self.table.get_mut(channel) else {
                warn!(%channel, "no actuator configured for channel, skipping");
                continue;
            };

            let position = clamp_position(position);
            if (position - state.current_position).abs() > self.deadband {
                let angle = state.config.angle_for(position);
                info!(%channel, "position: {:.2} (angle: {:.1}°)", position, angle);
                self.logged_moves += 1;
            }
            state.record(position);
        }

        self.batches += 1;
        Ok(())
    }

    fn shutdown(&mut self) -> ActuatorResult<()> {
        if !self.initialized {
            return Ok(());
        }
        for (_, state) in self.table.iter_mut() {
            state.current_position = 0.0;
        }
        self.initialized = false;
        info!("mock driver shut down");
        Ok(())
    }

    fn has_channel(&self, channel: &ChannelId) -> bool {
        self.table.contains(channel)
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.table.channels()
    }

    fn position(&self, channel: &ChannelId) -> Option<f64> {
        self.table.get(channel).map(|s| s.current_position)
    }
}
