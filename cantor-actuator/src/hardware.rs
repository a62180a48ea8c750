//! Hardware servo driver

use tracing::{info, warn};
use cantor_core::{ChannelId, ChannelMap, clamp_position};

use crate::config::ActuatorConfig;
use crate::driver::ActuatorDriver;
use crate::error::{ActuatorError, ActuatorResult};
use crate::state::{ActuatorState, ChannelTable};
use crate::sysfs::SysfsPwm;

/// Physical command channel carrying pulse widths to the servos
pub trait PulseOutput: Send {
    /// Claims the output of one servo
    fn attach(&mut self, config: &ActuatorConfig) -> ActuatorResult<()>;

    /// Emits a pulse width (µs) on the servo's output
    fn write_pulse(&mut self, config: &ActuatorConfig, pulse_us: f64) -> ActuatorResult<()>;

    /// Stops the pulse train and gives the output back
    fn release(&mut self, config: &ActuatorConfig) -> ActuatorResult<()>;
}

/// Drives real servos: position → angle → pulse width
pub struct HardwareDriver<O: PulseOutput = SysfsPwm> {
    output: O,
    table: ChannelTable,
    initialized: bool,
}

impl<O: PulseOutput> std::fmt::Debug for HardwareDriver<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareDriver")
            .field("channels", &self.table.channels())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl<O: PulseOutput> HardwareDriver<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            table: ChannelTable::default(),
            initialized: false,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn state(&self, channel: &ChannelId) -> Option<&ActuatorState> {
        self.table.get(channel)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn release_all(&mut self, configs: &[ActuatorConfig]) {
        for config in configs {
            if let Err(err) = self.output.release(config) {
                warn!(channel = %config.channel_id, %err, "failed to release output");
            }
        }
    }
}

impl<O: PulseOutput> ActuatorDriver for HardwareDriver<O> {
    fn kind(&self) -> &'static str {
        "hardware"
    }

    fn initialize(&mut self, configs: &[ActuatorConfig]) -> ActuatorResult<()> {
        if self.initialized {
            self.shutdown()?;
        }

        let table = ChannelTable::from_configs(configs)?;

        let mut attached: Vec<ActuatorConfig> = Vec::with_capacity(configs.len());
        for config in configs {
            if let Err(err) = self.output.attach(config) {
                self.release_all(&attached);
                return Err(match err {
                    ActuatorError::DriverInit(msg) => ActuatorError::DriverInit(msg),
                    other => ActuatorError::DriverInit(format!(
                        "channel '{}': {}",
                        config.channel_id, other
                    )),
                });
            }
            attached.push(config.clone());
        }

        for config in configs {
            if let Err(err) = self.output.write_pulse(config, config.closed_pulse()) {
                self.release_all(configs);
                return Err(ActuatorError::DriverInit(format!(
                    "channel '{}' rejected its closed pulse: {}",
                    config.channel_id, err
                )));
            }
            info!(
                channel = %config.channel_id,
                pwm = config.pwm_channel,
                "servo initialized"
            );
        }

        self.table = table;
        self.initialized = true;
        Ok(())
    }

    fn set_positions(&mut self, positions: &ChannelMap<f64>) -> ActuatorResult<()> {
        if !self.initialized {
            return Err(ActuatorError::NotInitialized);
        }

        let mut first_error = None;
        for (channel, &position) in positions {
            let Some(state) = self.table.get_mut(channel) else {
                warn!(%channel, "no actuator configured for channel, skipping");
                continue;
            };

            let position = clamp_position(position);
            let pulse = state.config.pulse_for(position);
            match self.output.write_pulse(&state.config, pulse) {
                Ok(()) => state.record(position),
                Err(err) => {
                    warn!(%channel, pulse, %err, "pulse write failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) -> ActuatorResult<()> {
        if !self.initialized {
            return Ok(());
        }

        let mut first_error = None;
        for (channel, state) in self.table.iter_mut() {
            match self.output.write_pulse(&state.config, state.config.closed_pulse()) {
                Ok(()) => state.current_position = 0.0,
                Err(err) => {
                    warn!(%channel, %err, "failed to close servo on shutdown");
                    first_error.get_or_insert(err);
                }
            }
        }

        for (channel, state) in self.table.iter() {
            if let Err(err) = self.output.release(&state.config) {
                warn!(%channel, %err, "failed to release output");
                first_error.get_or_insert(err);
            }
        }

        self.initialized = false;
        info!("hardware outputs released");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
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

impl<O: PulseOutput> Drop for HardwareDriver<O> {
    fn drop(&mut self) {
        if self.initialized {
            let _ = self.shutdown();
        }
    }
}
