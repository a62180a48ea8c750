//! Driver selection with mock fallback

use tracing::{info, warn};

use crate::config::ActuatorConfig;
use crate::driver::ActuatorDriver;
use crate::error::{ActuatorError, ActuatorResult};
use crate::hardware::HardwareDriver;
use crate::mock::MockDriver;
use crate::sysfs::{HardwareOptions, SysfsPwm};

/// Driver picked for a session.
///
/// Callers match once and hand the concrete driver to generic code, so
/// every tick is statically dispatched.
#[derive(Debug)]
pub enum DriverChoice {
    Hardware(HardwareDriver<SysfsPwm>),
    Mock(MockDriver),
}

impl DriverChoice {
    pub fn is_mock(&self) -> bool {
        matches!(self, DriverChoice::Mock(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DriverChoice::Hardware(driver) => driver.kind(),
            DriverChoice::Mock(driver) => driver.kind(),
        }
    }
}

fn open_hardware(
    configs: &[ActuatorConfig],
    options: &HardwareOptions,
) -> ActuatorResult<HardwareDriver<SysfsPwm>> {
    let output = SysfsPwm::open(options)?;
    let mut driver = HardwareDriver::new(output);
    driver.initialize(configs)?;
    Ok(driver)
}

/// Builds an initialized driver.
///
/// With `force_mock` the hardware is never touched. Otherwise a hardware
/// driver that fails with [`ActuatorError::DriverInit`] degrades to the
/// mock; configuration errors are returned.
pub fn select_driver(
    configs: &[ActuatorConfig],
    options: &HardwareOptions,
    force_mock: bool,
    deadband: f64,
) -> ActuatorResult<DriverChoice> {
    let mut mock = MockDriver::with_deadband(deadband);

    if force_mock {
        mock.initialize(configs)?;
        return Ok(DriverChoice::Mock(mock));
    }

    match open_hardware(configs, options) {
        Ok(driver) => {
            info!(chip = %options.pwm_chip.display(), "hardware driver ready");
            Ok(DriverChoice::Hardware(driver))
        }
        Err(ActuatorError::DriverInit(reason)) => {
            warn!(%reason, "hardware unavailable, falling back to mock driver");
            mock.initialize(configs)?;
            Ok(DriverChoice::Mock(mock))
        }
        Err(err) => Err(err),
    }
}
