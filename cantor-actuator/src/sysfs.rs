//! Linux sysfs PWM backend
//!
//! Each servo uses one channel of a PWM chip under `/sys/class/pwm`:
//!
//! ```text
//! pwmchip0/
//! ├── export            ← write N to create pwmN/
//! ├── unexport
//! └── pwmN/
//!     ├── period        ← 20 000 000 ns (50 Hz servo frame)
//!     ├── duty_cycle    ← pulse width in ns
//!     └── enable
//! ```
//!
//! `duty_cycle` stays open while attached so a tick costs one `write(2)`.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ActuatorConfig;
use crate::error::{ActuatorError, ActuatorResult};
use crate::hardware::PulseOutput;

/// Where and how the hardware driver emits pulses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareOptions {
    /// PWM chip directory
    pub pwm_chip: PathBuf,
    /// Servo frame period (ns)
    pub period_ns: u64,
}

impl Default for HardwareOptions {
    fn default() -> Self {
        Self {
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            period_ns: 20_000_000, // 50 Hz
        }
    }
}

fn write_attr(path: &Path, value: impl Display) -> std::io::Result<()> {
    fs::write(path, value.to_string())
}

/// Pulse output backed by sysfs PWM files
#[derive(Debug)]
pub struct SysfsPwm {
    chip: PathBuf,
    period_ns: u64,
    duty_files: HashMap<u32, File>,
    exported: Vec<u32>,
}

impl SysfsPwm {
    /// Opens a PWM chip; fails when the chip directory is absent
    pub fn open(options: &HardwareOptions) -> ActuatorResult<Self> {
        if !options.pwm_chip.is_dir() {
            return Err(ActuatorError::DriverInit(format!(
                "PWM chip {} not found",
                options.pwm_chip.display()
            )));
        }
        if options.period_ns == 0 {
            return Err(ActuatorError::InvalidConfig("PWM period must be > 0".into()));
        }

        Ok(Self {
            chip: options.pwm_chip.clone(),
            period_ns: options.period_ns,
            duty_files: HashMap::new(),
            exported: Vec::new(),
        })
    }

    fn channel_dir(&self, channel: u32) -> PathBuf {
        self.chip.join(format!("pwm{}", channel))
    }

    fn duty_ns(&self, pulse_us: f64) -> u64 {
        let ns = (pulse_us * 1000.0).round();
        if ns <= 0.0 {
            0
        } else {
            (ns as u64).min(self.period_ns)
        }
    }
}

impl PulseOutput for SysfsPwm {
    fn attach(&mut self, config: &ActuatorConfig) -> ActuatorResult<()> {
        let channel = config.pwm_channel;
        let dir = self.channel_dir(channel);
        let init_err = |what: &str, e: std::io::Error| {
            ActuatorError::DriverInit(format!("pwm{} {}: {}", channel, what, e))
        };

        if !dir.is_dir() {
            write_attr(&self.chip.join("export"), channel).map_err(|e| init_err("export", e))?;
            if !dir.is_dir() {
                return Err(ActuatorError::DriverInit(format!(
                    "pwm{} did not appear under {}",
                    channel,
                    self.chip.display()
                )));
            }
            self.exported.push(channel);
        }

        // duty must never exceed period, so clear it before setting the period
        write_attr(&dir.join("duty_cycle"), 0).map_err(|e| init_err("duty_cycle", e))?;
        write_attr(&dir.join("period"), self.period_ns).map_err(|e| init_err("period", e))?;
        write_attr(&dir.join("enable"), 1).map_err(|e| init_err("enable", e))?;

        let duty = OpenOptions::new()
            .write(true)
            .open(dir.join("duty_cycle"))
            .map_err(|e| init_err("open duty_cycle", e))?;
        self.duty_files.insert(channel, duty);

        debug!(channel = %config.channel_id, pwm = channel, "pwm output attached");
        Ok(())
    }

    fn write_pulse(&mut self, config: &ActuatorConfig, pulse_us: f64) -> ActuatorResult<()> {
        let duty_ns = self.duty_ns(pulse_us);
        let channel = config.pwm_channel;
        let file = self
            .duty_files
            .get_mut(&channel)
            .ok_or_else(|| ActuatorError::Write(format!("pwm{} is not attached", channel)))?;

        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(duty_ns.to_string().as_bytes()))
            .map_err(|e| ActuatorError::Write(format!("pwm{}: {}", channel, e)))
    }

    fn release(&mut self, config: &ActuatorConfig) -> ActuatorResult<()> {
        let channel = config.pwm_channel;
        let dir = self.channel_dir(channel);
        self.duty_files.remove(&channel);

        let release_err = |e: std::io::Error| ActuatorError::Write(format!("pwm{} release: {}", channel, e));

        write_attr(&dir.join("duty_cycle"), 0).map_err(release_err)?;
        write_attr(&dir.join("enable"), 0).map_err(release_err)?;

        if let Some(index) = self.exported.iter().position(|&c| c == channel) {
            self.exported.swap_remove(index);
            write_attr(&self.chip.join("unexport"), channel).map_err(release_err)?;
        }

        debug!(channel = %config.channel_id, pwm = channel, "pwm output released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_chip(channels: &[u32]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for channel in channels {
            fs::create_dir(dir.path().join(format!("pwm{}", channel))).unwrap();
        }
        dir
    }

    fn options(chip: &Path) -> HardwareOptions {
        HardwareOptions {
            pwm_chip: chip.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_chip_is_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SysfsPwm::open(&options(&dir.path().join("pwmchip9")));
        assert!(matches!(result, Err(ActuatorError::DriverInit(_))));
    }

    #[test]
    fn test_attach_configures_channel() {
        let chip = fake_chip(&[0]);
        let mut pwm = SysfsPwm::open(&options(chip.path())).unwrap();
        let config = ActuatorConfig::new("servo1", 0);

        pwm.attach(&config).unwrap();

        let dir = chip.path().join("pwm0");
        assert_eq!(fs::read_to_string(dir.join("period")).unwrap(), "20000000");
        assert_eq!(fs::read_to_string(dir.join("enable")).unwrap(), "1");
    }

    #[test]
    fn test_write_pulse_in_nanoseconds() {
        let chip = fake_chip(&[2]);
        let mut pwm = SysfsPwm::open(&options(chip.path())).unwrap();
        let config = ActuatorConfig::new("servo3", 2);

        pwm.attach(&config).unwrap();
        pwm.write_pulse(&config, 850.0).unwrap();

        let duty = fs::read_to_string(chip.path().join("pwm2/duty_cycle")).unwrap();
        assert_eq!(duty, "850000");
    }

    #[test]
    fn test_write_before_attach_fails() {
        let chip = fake_chip(&[0]);
        let mut pwm = SysfsPwm::open(&options(chip.path())).unwrap();
        let config = ActuatorConfig::new("servo1", 0);
        assert!(matches!(pwm.write_pulse(&config, 500.0), Err(ActuatorError::Write(_))));
    }

    #[test]
    fn test_export_without_kernel_fails() {
        // a plain directory accepts the export write but never grows pwm1/
        let chip = fake_chip(&[]);
        let mut pwm = SysfsPwm::open(&options(chip.path())).unwrap();
        let result = pwm.attach(&ActuatorConfig::new("servo2", 1));
        assert!(matches!(result, Err(ActuatorError::DriverInit(_))));
    }

    #[test]
    fn test_release_disables() {
        let chip = fake_chip(&[0]);
        let mut pwm = SysfsPwm::open(&options(chip.path())).unwrap();
        let config = ActuatorConfig::new("servo1", 0);

        pwm.attach(&config).unwrap();
        pwm.release(&config).unwrap();

        assert_eq!(fs::read_to_string(chip.path().join("pwm0/enable")).unwrap(), "0");
        assert!(pwm.write_pulse(&config, 500.0).is_err());
    }

    #[test]
    fn test_duty_clamped_to_period() {
        let chip = fake_chip(&[]);
        let pwm = SysfsPwm::open(&HardwareOptions {
            pwm_chip: chip.path().to_path_buf(),
            period_ns: 1_000_000,
        })
        .unwrap();
        assert_eq!(pwm.duty_ns(2500.0), 1_000_000);
        assert_eq!(pwm.duty_ns(-5.0), 0);
        assert_eq!(pwm.duty_ns(1500.4), 1_000_000);
    }
}
