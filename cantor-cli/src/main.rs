//! cantor - singing servos
//! Command-line interface for playing, filtering and recording motion curves

mod commands;
mod config;

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::PlayOptions;
use config::{CantorConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "cantor")]
#[command(author = "Cantor Contributors")]
#[command(version = "2026.10.18")]
#[command(about = "cantor - make servo mouths sing along with songs", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a song's curves on the servos
    Play {
        /// Song name
        #[arg(value_name = "SONG")]
        song: String,

        /// Never touch the hardware
        #[arg(long)]
        mock: bool,

        /// Play the stored curves without rate limiting
        #[arg(long)]
        no_filter: bool,

        /// Stop after this many seconds instead of at the end of the curves
        #[arg(long, value_name = "SECONDS")]
        duration: Option<f64>,
    },

    /// Rate-limit stored curves in place
    Filter {
        /// Only this song (default: all)
        #[arg(value_name = "SONG")]
        song: Option<String>,

        /// Minimum time between movements (default: playback.min_dwell_ms)
        #[arg(long, value_name = "MS")]
        min_time: Option<u64>,

        /// Do not save .backup files
        #[arg(long)]
        no_backup: bool,
    },

    /// Put .backup curves back in place
    Restore {
        /// Only this song (default: all)
        #[arg(value_name = "SONG")]
        song: Option<String>,
    },

    /// List songs with stored curves
    Songs,

    /// Sweep servos through one open/close cycle
    Test {
        /// Only this servo (default: all)
        #[arg(long, value_name = "NAME")]
        servo: Option<String>,

        /// Seconds per servo
        #[arg(long, default_value_t = 2.0)]
        duration: f64,

        /// Never touch the hardware
        #[arg(long)]
        mock: bool,
    },

    /// Build a curve from recorded key presses
    Record {
        /// Song name
        #[arg(value_name = "SONG")]
        song: String,

        /// Servo the curve is for
        #[arg(long, value_name = "NAME")]
        channel: String,

        /// JSON list of {"time", "action"} events
        #[arg(long, value_name = "FILE")]
        events: PathBuf,

        /// Song length in seconds
        #[arg(long, value_name = "SECONDS")]
        duration: f64,

        /// Minimum time between movements (default: playback.min_dwell_ms)
        #[arg(long, value_name = "MS")]
        min_time: Option<u64>,
    },

    /// Write the default configuration
    Config {
        /// Output file (default: cantor.toml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    // matches every cantor_* crate as well
    let default_filter = if verbose { "cantor=debug" } else { "cantor=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Config { path } = &cli.command {
        let path = path.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        return commands::write_config(&path);
    }

    let config = CantorConfig::load(&cli.config)?;

    match cli.command {
        Commands::Play {
            song,
            mock,
            no_filter,
            duration,
        } => commands::play(
            &config,
            PlayOptions {
                song,
                mock,
                no_filter,
                duration,
            },
        ),

        Commands::Filter {
            song,
            min_time,
            no_backup,
        } => commands::filter(&config, song.as_deref(), min_time, no_backup),

        Commands::Restore { song } => commands::restore(&config, song.as_deref()),

        Commands::Songs => commands::songs(&config),

        Commands::Test { servo, duration, mock } => {
            commands::servo_test(&config, servo.as_deref(), duration, mock)
        }

        Commands::Record {
            song,
            channel,
            events,
            duration,
            min_time,
        } => commands::record(&config, &song, &channel, &events, duration, min_time),

        Commands::Config { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
