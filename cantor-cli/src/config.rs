//! cantor.toml

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use cantor_actuator::{ActuatorConfig, ChannelTable, HardwareOptions, DEFAULT_DEADBAND};
use cantor_core::{ChannelId, CurveLibrary, RateLimitFilter, DEFAULT_MIN_DWELL_MS};
use cantor_sync::{SchedulerConfig, SchedulerMode, DEFAULT_TICK_MS};

/// Default configuration file name
pub const CONFIG_FILE: &str = "cantor.toml";

/// Whole tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CantorConfig {
    /// Playback tuning
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// PWM chip used by the hardware driver
    #[serde(default)]
    pub hardware: HardwareOptions,

    /// Where songs and curves live
    #[serde(default)]
    pub paths: PathsConfig,

    /// One entry per servo
    #[serde(default = "default_servos")]
    pub servos: Vec<ActuatorConfig>,
}

/// `[playback]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Minimum time between accepted position changes
    pub min_dwell_ms: u64,
    /// Tick interval of the playback loop
    pub tick_ms: u64,
    /// Pacing of the playback loop: `fixed_rate`, `fixed_delay` or `best_effort`
    pub schedule: SchedulerMode,
    /// Mock driver logs moves larger than this
    pub mock_deadband: f64,
    /// Rate-limit curves when a song is loaded
    pub apply_filter: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_dwell_ms: DEFAULT_MIN_DWELL_MS,
            tick_ms: DEFAULT_TICK_MS,
            schedule: SchedulerMode::default(),
            mock_deadband: DEFAULT_DEADBAND,
            apply_filter: true,
        }
    }
}

/// `[paths]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Audio files
    pub songs_dir: PathBuf,
    /// Motion curve files
    pub curve_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            songs_dir: PathBuf::from("songs"),
            curve_dir: PathBuf::from("processed/servo_data"),
        }
    }
}

fn default_servos() -> Vec<ActuatorConfig> {
    vec![
        ActuatorConfig::new("servo1", 0),
        ActuatorConfig::new("servo2", 1),
        ActuatorConfig::new("servo3", 2),
    ]
}

impl Default for CantorConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            hardware: HardwareOptions::default(),
            paths: PathsConfig::default(),
            servos: default_servos(),
        }
    }
}

impl CantorConfig {
    /// Parses and validates a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }

    /// Writes the configuration, refusing to overwrite an existing file
    pub fn write_new(&self, path: &Path) -> Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.servos.is_empty() {
            bail!("at least one [[servos]] entry is required");
        }
        ChannelTable::from_configs(&self.servos)?;

        let mut outputs = HashSet::new();
        for servo in &self.servos {
            if !outputs.insert(servo.pwm_channel) {
                bail!(
                    "servo '{}' reuses pwm_channel {}",
                    servo.channel_id,
                    servo.pwm_channel
                );
            }
        }

        if self.playback.tick_ms == 0 {
            bail!("playback.tick_ms must be at least 1");
        }
        if !(self.playback.mock_deadband >= 0.0) {
            bail!("playback.mock_deadband must be >= 0");
        }
        Ok(())
    }

    /// Configured channel ids, in `[[servos]]` order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.servos.iter().map(|s| s.channel_id.clone()).collect()
    }

    /// Opens the curve directory, splitting file names on the configured channels
    pub fn library(&self) -> Result<CurveLibrary> {
        CurveLibrary::open_with_channels(&self.paths.curve_dir, self.channel_ids())
            .with_context(|| format!("failed to open {}", self.paths.curve_dir.display()))
    }

    pub fn filter(&self) -> RateLimitFilter {
        RateLimitFilter::from_millis(self.playback.min_dwell_ms)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::from_tick_ms(self.playback.tick_ms).with_mode(self.playback.schedule)
    }
}
