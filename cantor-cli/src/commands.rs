//! Subcommand implementations

use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::*;
use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, warn};

use cantor_actuator::{select_driver, ActuatorDriver, DriverChoice};
use cantor_core::{io, ChannelId, ChannelMap, CurveLibrary, KeyEvent, MotionCurve, MovementRecorder, RateLimitFilter};
use cantor_sync::{run_session, ClockTransport, Scheduler, SessionCommand, SessionEnd, SyncPlayer};

use crate::config::CantorConfig;

/// Steps of one test sweep
pub const SWEEP_STEPS: usize = 20;

// ============================================================================
// Playback
// ============================================================================

pub struct PlayOptions {
    pub song: String,
    pub mock: bool,
    pub no_filter: bool,
    pub duration: Option<f64>,
}

pub fn play(config: &CantorConfig, options: PlayOptions) -> Result<()> {
    let library = config.library()?;
    if !library.has_song(&options.song) {
        let available: Vec<&str> = library.songs().collect();
        bail!(
            "no curves for song '{}' in {} (available: {})",
            options.song,
            config.paths.curve_dir.display(),
            if available.is_empty() { "none".to_string() } else { available.join(", ") }
        );
    }

    let channels = config.channel_ids();
    let loaded = library.load_song(&options.song, &channels)?;
    for channel in &loaded.missing {
        println!("{} no curve for {}", "warning:".yellow().bold(), channel.as_str().cyan());
    }
    for (channel, err) in &loaded.rejected {
        println!("{} {} skipped: {}", "warning:".yellow().bold(), channel.as_str().cyan(), err);
    }

    let curves = if config.playback.apply_filter && !options.no_filter {
        apply_filter(loaded.curves, &config.filter())
    } else {
        loaded.curves
    };

    let end = match options.duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => duration,
        Some(duration) => bail!("--duration must be a positive number of seconds, got {}", duration),
        None => curves.values().map(MotionCurve::end_time).fold(0.0, f64::max),
    };
    let length = match Duration::try_from_secs_f64(end) {
        Ok(length) => length,
        Err(err) => bail!("cannot play for {} s: {}", end, err),
    };

    match CurveLibrary::find_audio(&options.song, &config.paths.songs_dir) {
        Some(audio) => println!(
            "{} start {} in your audio player now",
            "Audio:".bold(),
            audio.display().to_string().cyan()
        ),
        None => println!(
            "{} no audio file for '{}' in {}, playing curves only",
            "warning:".yellow().bold(),
            options.song,
            config.paths.songs_dir.display()
        ),
    }

    let choice = select_driver(
        &config.servos,
        &config.hardware,
        options.mock,
        config.playback.mock_deadband,
    )?;
    println!(
        "{} '{}' on {} driver ({:.1} s, Ctrl+C to stop)",
        "Playing".green().bold(),
        options.song.cyan(),
        choice.kind(),
        end
    );

    match choice {
        DriverChoice::Hardware(driver) => run_playback(driver, curves, config, length),
        DriverChoice::Mock(driver) => run_playback(driver, curves, config, length),
    }
}

fn apply_filter(curves: ChannelMap<MotionCurve>, filter: &RateLimitFilter) -> ChannelMap<MotionCurve> {
    curves
        .into_iter()
        .map(|(channel, curve)| {
            let before = curve.count_changes();
            let filtered = filter.apply(curve);
            debug!(%channel, before, after = filtered.count_changes(), "curve rate-limited");
            (channel, filtered)
        })
        .collect()
}

fn run_playback<D: ActuatorDriver>(
    driver: D,
    curves: ChannelMap<MotionCurve>,
    config: &CantorConfig,
    length: Duration,
) -> Result<()> {
    let mut player = SyncPlayer::new(driver);
    let report = player.load(curves)?;
    for channel in &report.skipped {
        println!("{} {} has no servo configured", "warning:".yellow().bold(), channel.as_str().cyan());
    }

    let (tx, rx) = unbounded();
    spawn_interrupt_listener(tx)?;

    let mut scheduler = Scheduler::new(config.scheduler());
    let mut transport = ClockTransport::with_duration(length);
    transport.start();

    let session = run_session(&mut player, &mut transport, &mut scheduler, &rx);
    let shutdown = player.shutdown();
    let session = session?;
    if let Err(err) = shutdown {
        warn!(%err, "driver shutdown incomplete");
    }

    let outcome = match session.end {
        SessionEnd::Finished => "Finished".green().bold(),
        SessionEnd::Interrupted => "Interrupted".yellow().bold(),
    };
    println!(
        "{} {} ticks, {} missed, max tick {} µs",
        outcome,
        session.ticks,
        session.stats.missed_ticks,
        session.stats.max_execution_time.as_micros()
    );
    Ok(())
}

/// Forwards Ctrl+C to the session as a stop command
fn spawn_interrupt_listener(tx: Sender<SessionCommand>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;

    thread::Builder::new()
        .name("cantor-signal".into())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = tx.send(SessionCommand::Stop);
                }
            });
        })
        .context("failed to spawn signal thread")?;
    Ok(())
}

// ============================================================================
// Curve maintenance
// ============================================================================

/// Movement counts of one filtered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub path: PathBuf,
    pub original: usize,
    pub filtered: usize,
    pub backed_up: bool,
}

/// Rate-limits curve files in place
pub fn filter_files(files: &[PathBuf], filter: &RateLimitFilter, backup: bool) -> Result<Vec<FilterOutcome>> {
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let curve = io::read_curve(path)?;
        let original = curve.count_changes();
        let backed_up = backup && io::backup_curve(path)?;

        let filtered = filter.apply(curve);
        io::write_curve(path, &filtered)?;

        outcomes.push(FilterOutcome {
            path: path.clone(),
            original,
            filtered: filtered.count_changes(),
            backed_up,
        });
    }
    Ok(outcomes)
}

pub fn filter(config: &CantorConfig, song: Option<&str>, min_time: Option<u64>, no_backup: bool) -> Result<()> {
    let library = config.library()?;
    let files = library.curve_files(song);
    if files.is_empty() {
        bail!(
            "no curve files{} in {}",
            song.map(|s| format!(" for '{}'", s)).unwrap_or_default(),
            config.paths.curve_dir.display()
        );
    }

    let filter = min_time.map_or_else(|| config.filter(), RateLimitFilter::from_millis);
    println!(
        "{} {} file(s), minimum {:.0} ms between moves",
        "Filtering".green().bold(),
        files.len(),
        filter.min_dwell() * 1000.0
    );

    let outcomes = filter_files(&files, &filter, !no_backup)?;
    let (mut before, mut after) = (0, 0);
    for outcome in &outcomes {
        before += outcome.original;
        after += outcome.filtered;
        println!(
            "  {} {} → {} movements{}",
            file_name(&outcome.path).cyan(),
            outcome.original,
            outcome.filtered,
            if outcome.backed_up { " (backup saved)" } else { "" }
        );
    }
    println!(
        "{} removed {} of {} movements",
        "    Finished".green().bold(),
        before - after,
        before
    );
    Ok(())
}

pub fn restore(config: &CantorConfig, song: Option<&str>) -> Result<()> {
    let library = config.library()?;
    let backups = library.backup_files(song)?;
    if backups.is_empty() {
        bail!("no backups found in {}", config.paths.curve_dir.display());
    }
    for backup in &backups {
        let restored = io::restore_backup(backup)?;
        println!("{} {}", "  Restored".green().bold(), file_name(&restored).cyan());
    }
    Ok(())
}

pub fn songs(config: &CantorConfig) -> Result<()> {
    let library = config.library()?;
    if library.is_empty() {
        println!("No songs in {}", config.paths.curve_dir.display());
        return Ok(());
    }

    println!("{}", "Available songs:".bold());
    for song in library.songs() {
        let channels: Vec<String> = library
            .channels_for(song)
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let audio = match CurveLibrary::find_audio(song, &config.paths.songs_dir) {
            Some(_) => "audio".green(),
            None => "no audio".yellow(),
        };
        println!("  {} [{}] ({})", song.cyan(), channels.join(", "), audio);
    }
    Ok(())
}

/// Records a curve from a JSON list of `{ "time": s, "action": "press" | "release" }`
pub fn record(
    config: &CantorConfig,
    song: &str,
    channel: &str,
    events: &Path,
    duration: f64,
    min_time: Option<u64>,
) -> Result<()> {
    let content = fs::read_to_string(events)
        .with_context(|| format!("failed to read {}", events.display()))?;
    let events: Vec<KeyEvent> = serde_json::from_str(&content)
        .with_context(|| format!("invalid event list in {}", events.display()))?;

    let mut recorder = MovementRecorder::new();
    let accepted = recorder.record(events.iter().copied());
    if accepted < events.len() {
        println!(
            "{} ignored {} out-of-order or repeated event(s)",
            "warning:".yellow().bold(),
            events.len() - accepted
        );
    }

    let filter = min_time.map_or_else(|| config.filter(), RateLimitFilter::from_millis);
    let curve = filter.apply(recorder.to_curve(duration)?);

    fs::create_dir_all(&config.paths.curve_dir)
        .with_context(|| format!("failed to create {}", config.paths.curve_dir.display()))?;
    let path = io::curve_path(&config.paths.curve_dir, song, &ChannelId::new(channel));
    io::write_curve(&path, &curve)?;

    println!(
        "{} {} ({} movements)",
        "   Created".green().bold(),
        path.display().to_string().cyan(),
        curve.count_changes()
    );
    Ok(())
}

// ============================================================================
// Servo test
// ============================================================================

/// One sine period from half-open, `steps` positions
pub fn sweep_positions(steps: usize) -> Vec<f64> {
    (0..steps)
        .map(|i| ((i as f64 * TAU / steps as f64).sin() + 1.0) / 2.0)
        .collect()
}

fn sweep<D: ActuatorDriver>(driver: &mut D, channels: &[ChannelId], duration: f64) -> Result<()> {
    let pause = Duration::from_secs_f64(duration / SWEEP_STEPS as f64);
    for channel in channels {
        println!("{} {}", "Testing".green().bold(), channel.as_str().cyan());
        for position in sweep_positions(SWEEP_STEPS) {
            driver.set_position(channel, position)?;
            thread::sleep(pause);
        }
        driver.set_position(channel, 0.0)?;
    }
    println!("Closing all servos...");
    driver.close_all()?;
    driver.shutdown()?;
    Ok(())
}

pub fn servo_test(config: &CantorConfig, servo: Option<&str>, duration: f64, mock: bool) -> Result<()> {
    if !(duration.is_finite() && duration > 0.0) {
        bail!("--duration must be a positive number of seconds");
    }

    let channels: Vec<ChannelId> = match servo {
        Some(name) => {
            let id = ChannelId::new(name);
            if !config.servos.iter().any(|s| s.channel_id == id) {
                bail!("no servo named '{}' in the configuration", name);
            }
            vec![id]
        }
        None => config.servos.iter().map(|s| s.channel_id.clone()).collect(),
    };

    match select_driver(&config.servos, &config.hardware, mock, config.playback.mock_deadband)? {
        DriverChoice::Hardware(mut driver) => sweep(&mut driver, &channels, duration),
        DriverChoice::Mock(mut driver) => sweep(&mut driver, &channels, duration),
    }
}

pub fn write_config(path: &Path) -> Result<()> {
    CantorConfig::default().write_new(path)?;
    println!("{} {}", "   Created".green().bold(), path.display().to_string().cyan());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
