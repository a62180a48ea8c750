//! Integration tests for cantor-actuator

use std::sync::{Arc, Mutex};
use crate::*;
use cantor_core::{ChannelId, ChannelMap};

// ═══════════════════════════════════════════════════════════════════════════
// TEST OUTPUT
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum OutputEvent {
    Attach(u32),
    Pulse(u32, f64),
    Release(u32),
}

/// Pulse output recording every call; optionally failing on one channel
#[derive(Debug, Clone, Default)]
struct RecordingOutput {
    events: Arc<Mutex<Vec<OutputEvent>>>,
    fail_attach: Option<u32>,
    fail_write: Arc<Mutex<Option<u32>>>,
}

impl RecordingOutput {
    fn break_channel(&self, channel: u32) {
        *self.fail_write.lock().unwrap() = Some(channel);
    }

    fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().unwrap().clone()
    }

    fn pulses(&self, channel: u32) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Pulse(c, p) if c == channel => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl PulseOutput for RecordingOutput {
    fn attach(&mut self, config: &ActuatorConfig) -> ActuatorResult<()> {
        if self.fail_attach == Some(config.pwm_channel) {
            return Err(ActuatorError::DriverInit(format!("pwm{} busy", config.pwm_channel)));
        }
        self.events.lock().unwrap().push(OutputEvent::Attach(config.pwm_channel));
        Ok(())
    }

    fn write_pulse(&mut self, config: &ActuatorConfig, pulse_us: f64) -> ActuatorResult<()> {
        if *self.fail_write.lock().unwrap() == Some(config.pwm_channel) {
            return Err(ActuatorError::Write(format!("pwm{} gone", config.pwm_channel)));
        }
        self.events
            .lock()
            .unwrap()
            .push(OutputEvent::Pulse(config.pwm_channel, pulse_us));
        Ok(())
    }

    fn release(&mut self, config: &ActuatorConfig) -> ActuatorResult<()> {
        self.events.lock().unwrap().push(OutputEvent::Release(config.pwm_channel));
        Ok(())
    }
}

fn configs() -> Vec<ActuatorConfig> {
    vec![
        ActuatorConfig::new("servo1", 0),
        ActuatorConfig::new("servo2", 1).with_angles(10.0, 70.0),
        ActuatorConfig::new("servo3", 2).with_pulse_range(1000.0, 2000.0),
    ]
}

fn positions(pairs: &[(&str, f64)]) -> ChannelMap<f64> {
    pairs.iter().map(|(c, p)| (ChannelId::new(*c), *p)).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// HARDWARE DRIVER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_hardware_initialize_closes_all() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();

    assert_eq!(output.pulses(0), vec![500.0]);
    assert_eq!(output.pulses(1), vec![500.0]);
    assert_eq!(output.pulses(2), vec![1000.0]);
    assert_eq!(driver.channels().len(), 3);
}

#[test]
fn test_hardware_pulse_mapping() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();

    driver
        .set_positions(&positions(&[("servo1", 1.0), ("servo2", 0.5), ("servo3", 0.25)]))
        .unwrap();

    assert_eq!(output.pulses(0).last(), Some(&1200.0));
    assert!((output.pulses(1).last().unwrap() - 850.0).abs() < 1e-9);
    assert!((output.pulses(2).last().unwrap() - 1250.0).abs() < 1e-9);
    assert_eq!(driver.position(&"servo3".into()), Some(0.25));
}

#[test]
fn test_hardware_clamps_out_of_range_positions() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();

    driver
        .set_positions(&positions(&[("servo1", 4.0), ("servo3", -1.0)]))
        .unwrap();

    assert_eq!(output.pulses(0).last(), Some(&1200.0));
    assert_eq!(output.pulses(2).last(), Some(&1000.0));
    assert_eq!(driver.position(&"servo1".into()), Some(1.0));
}

#[test]
fn test_hardware_unknown_channel_skipped() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();

    let result = driver.set_positions(&positions(&[("servo9", 0.5), ("servo1", 0.5)]));
    assert!(result.is_ok());
    assert_eq!(driver.position(&"servo1".into()), Some(0.5));
    assert_eq!(driver.position(&"servo9".into()), None);
}

#[test]
fn test_hardware_closed_pulse_failure_is_init_error() {
    let output = RecordingOutput::default();
    output.break_channel(1);
    let mut driver = HardwareDriver::new(output.clone());

    assert!(matches!(driver.initialize(&configs()), Err(ActuatorError::DriverInit(_))));
    assert!(!driver.is_initialized());
}

#[test]
fn test_hardware_write_failure_isolated() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();
    output.break_channel(1);

    let result = driver.set_positions(&positions(&[("servo2", 0.7), ("servo1", 0.3)]));

    assert!(matches!(result, Err(ActuatorError::Write(_))));
    assert_eq!(driver.position(&"servo1".into()), Some(0.3));
    assert_eq!(driver.position(&"servo2".into()), Some(0.0));
}

#[test]
fn test_hardware_attach_failure_releases_attached() {
    let output = RecordingOutput {
        fail_attach: Some(2),
        ..Default::default()
    };
    let mut driver = HardwareDriver::new(output.clone());

    let result = driver.initialize(&configs());
    assert!(matches!(result, Err(ActuatorError::DriverInit(_))));
    assert!(!driver.is_initialized());

    let events = output.events();
    assert!(events.contains(&OutputEvent::Release(0)));
    assert!(events.contains(&OutputEvent::Release(1)));
}

#[test]
fn test_hardware_not_initialized() {
    let mut driver = HardwareDriver::new(RecordingOutput::default());
    let result = driver.set_positions(&positions(&[("servo1", 0.5)]));
    assert_eq!(result, Err(ActuatorError::NotInitialized));
}

#[test]
fn test_hardware_shutdown_closes_then_releases() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();
    driver.set_positions(&positions(&[("servo1", 1.0)])).unwrap();

    driver.shutdown().unwrap();

    let events = output.events();
    let last_pulse = events
        .iter()
        .rposition(|e| matches!(e, OutputEvent::Pulse(0, _)))
        .unwrap();
    let release = events
        .iter()
        .position(|e| *e == OutputEvent::Release(0))
        .unwrap();
    assert_eq!(events[last_pulse], OutputEvent::Pulse(0, 500.0));
    assert!(last_pulse < release);
    assert_eq!(driver.position(&"servo1".into()), Some(0.0));

    // second shutdown is a no-op
    let count = output.events().len();
    driver.shutdown().unwrap();
    assert_eq!(output.events().len(), count);
}

#[test]
fn test_hardware_drop_releases_outputs() {
    let output = RecordingOutput::default();
    {
        let mut driver = HardwareDriver::new(output.clone());
        driver.initialize(&configs()).unwrap();
    }
    let releases = output
        .events()
        .into_iter()
        .filter(|e| matches!(e, OutputEvent::Release(_)))
        .count();
    assert_eq!(releases, 3);
}

#[test]
fn test_close_all_default_method() {
    let output = RecordingOutput::default();
    let mut driver = HardwareDriver::new(output.clone());
    driver.initialize(&configs()).unwrap();
    driver
        .set_positions(&positions(&[("servo1", 1.0), ("servo2", 1.0), ("servo3", 1.0)]))
        .unwrap();

    driver.close_all().unwrap();

    for channel in driver.channels() {
        assert_eq!(driver.position(&channel), Some(0.0));
    }
    assert_eq!(output.pulses(2).last(), Some(&1000.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// MOCK DRIVER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_mock_records_latest_position() {
    let mut driver = MockDriver::with_configs(&configs()).unwrap();

    driver.set_positions(&positions(&[("servo1", 0.2)])).unwrap();
    driver.set_positions(&positions(&[("servo1", 0.9)])).unwrap();

    assert_eq!(driver.position(&"servo1".into()), Some(0.9));
    assert_eq!(driver.state(&"servo1".into()).unwrap().movements, 2);
    assert_eq!(driver.batches(), 2);
}

#[test]
fn test_mock_deadband_gates_logging() {
    let mut driver = MockDriver::with_configs(&configs()).unwrap();

    // smooth ramp in 0.05 steps never crosses the 0.1 deadband
    for step in 1..=10 {
        let position = step as f64 * 0.05;
        driver.set_positions(&positions(&[("servo1", position)])).unwrap();
    }
    assert_eq!(driver.logged_moves(), 0);

    // a jump does
    driver.set_positions(&positions(&[("servo1", 0.0)])).unwrap();
    assert_eq!(driver.logged_moves(), 1);
}

#[test]
fn test_mock_unknown_channel_skipped() {
    let mut driver = MockDriver::with_configs(&configs()).unwrap();
    assert!(driver.set_positions(&positions(&[("ghost", 1.0)])).is_ok());
    assert!(!driver.has_channel(&"ghost".into()));
}

#[test]
fn test_mock_not_initialized() {
    let mut driver = MockDriver::new();
    assert_eq!(
        driver.set_positions(&positions(&[("servo1", 1.0)])),
        Err(ActuatorError::NotInitialized)
    );
}

#[test]
fn test_mock_shutdown_closes() {
    let mut driver = MockDriver::with_configs(&configs()).unwrap();
    driver.set_positions(&positions(&[("servo2", 0.8)])).unwrap();
    driver.shutdown().unwrap();

    assert!(driver.positions().values().all(|&p| p == 0.0));
    assert!(!driver.is_initialized());
}

#[test]
fn test_set_position_single_channel() {
    let mut driver = MockDriver::with_configs(&configs()).unwrap();
    driver.set_position(&"servo3".into(), 0.6).unwrap();
    assert_eq!(driver.position(&"servo3".into()), Some(0.6));
}
