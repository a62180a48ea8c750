//! # 🦾 cantor-actuator — Servo Drivers
//!
//! Converts normalized mouth positions into servo commands. Every channel is
//! calibrated by an [`ActuatorConfig`]; commands flow through the
//! [`ActuatorDriver`] trait, implemented exactly twice:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │        ActuatorDriver (trait)                 │
//! │  initialize() · set_positions() · shutdown()  │
//! └───────────────────────────────────────────────┘
//!          ↓                          ↓
//! ┌──────────────────┐      ┌──────────────────┐
//! │  HardwareDriver  │      │    MockDriver    │
//! │ position → angle │      │ records + logs   │
//! │ angle → pulse µs │      │ (deadband 0.1)   │
//! └──────────────────┘      └──────────────────┘
//!          ↓
//!    PulseOutput (sysfs PWM)
//! ```
//!
//! The driver is chosen once per session by [`select_driver`]. A hardware
//! driver that cannot attach falls back to the mock, so a session always
//! runs, if only in observation mode.
//!
//! ## Usage
//!
//! ```rust
//! use cantor_actuator::{ActuatorConfig, ActuatorDriver, MockDriver};
//! use cantor_core::ChannelMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let configs = vec![ActuatorConfig::new("servo1", 0)];
//! let mut driver = MockDriver::new();
//! driver.initialize(&configs)?;
//!
//! let mut positions = ChannelMap::new();
//! positions.insert("servo1".into(), 0.75);
//! driver.set_positions(&positions)?;
//!
//! assert_eq!(driver.position(&"servo1".into()), Some(0.75));
//! driver.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! - Positions are clamped to `[0, 1]` and pulses to the calibrated range
//! - `shutdown()` always closes every mouth before releasing the outputs
//! - Unknown channels are skipped with a warning, never fatal

pub mod error;
pub mod config;
pub mod state;
pub mod driver;
pub mod hardware;
pub mod sysfs;
pub mod mock;
pub mod select;

pub use error::{ActuatorError, ActuatorResult};
pub use config::ActuatorConfig;
pub use state::{ActuatorState, ChannelTable};
pub use driver::ActuatorDriver;
pub use hardware::{HardwareDriver, PulseOutput};
pub use sysfs::{HardwareOptions, SysfsPwm};
pub use mock::{MockDriver, DEFAULT_DEADBAND};
pub use select::{select_driver, DriverChoice};

#[cfg(test)]
mod tests;
