//! Per-channel runtime state shared by both drivers

use serde::{Deserialize, Serialize};
use cantor_core::{ChannelId, ChannelMap};
use crate::config::ActuatorConfig;
use crate::error::{ActuatorError, ActuatorResult};

/// Runtime state of one servo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Calibration
    pub config: ActuatorConfig,
    /// Last commanded position (0 = closed, 1 = open)
    pub current_position: f64,
    /// Commands accepted since initialization
    pub movements: u64,
}

impl ActuatorState {
    pub fn new(config: ActuatorConfig) -> Self {
        Self {
            config,
            current_position: 0.0,
            movements: 0,
        }
    }

    pub(crate) fn record(&mut self, position: f64) {
        self.current_position = position;
        self.movements += 1;
    }
}

/// Configured channels of a driver, keyed by channel id
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    states: ChannelMap<ActuatorState>,
}

impl ChannelTable {
    /// Validates every config and rejects duplicate channel ids
    pub fn from_configs(configs: &[ActuatorConfig]) -> ActuatorResult<Self> {
        let mut states = ChannelMap::with_capacity(configs.len());
        for config in configs {
            config.validate()?;
            if states.contains_key(&config.channel_id) {
                return Err(ActuatorError::InvalidConfig(format!(
                    "channel '{}' configured twice",
                    config.channel_id
                )));
            }
            states.insert(config.channel_id.clone(), ActuatorState::new(config.clone()));
        }
        Ok(Self { states })
    }

    pub fn get(&self, channel: &ChannelId) -> Option<&ActuatorState> {
        self.states.get(channel)
    }

    pub fn get_mut(&mut self, channel: &ChannelId) -> Option<&mut ActuatorState> {
        self.states.get_mut(channel)
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.states.contains_key(channel)
    }

    /// Channel ids, sorted
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self.states.keys().cloned().collect();
        channels.sort();
        channels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &ActuatorState)> {
        self.states.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ChannelId, &mut ActuatorState)> {
        self.states.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
