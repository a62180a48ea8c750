//! Actuator layer errors

use thiserror::Error;
use cantor_core::ChannelId;

pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Actuator errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Hardware could not attach to the physical channel(s)
    #[error("Driver initialization failed: {0}")]
    DriverInit(String),

    /// A channel has no matching actuator configuration
    #[error("No actuator configured for channel '{0}'")]
    ConfigMismatch(ChannelId),

    /// Calibration values are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing a command to an output failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Driver used before `initialize()`
    #[error("Driver not initialized")]
    NotInitialized,
}
