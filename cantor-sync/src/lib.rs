//! # 🎤 cantor-sync — Playback Synchronisation
//!
//! Plays motion curves onto servo drivers in step with an audio transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  position()   ┌──────────────────────────────┐
//! │ Transport  │ ────────────→ │          run_session         │
//! │ (audio)    │  is_playing() │  Scheduler (100 Hz)          │
//! └────────────┘               │    ↓ once per tick           │
//!                              │  SessionCommand? (crossbeam) │
//!                              │    ↓                         │
//!                              │  SyncPlayer::tick(t)         │
//!                              │    every channel @ same t    │
//!                              └──────────────┬───────────────┘
//!                                             ↓ one batch
//!                                      ActuatorDriver
//! ```
//!
//! Whatever ends a session (end of track, stop command, an unwinding
//! panic) the player leaves every loaded channel closed.
//!
//! ## Usage
//!
//! ```rust
//! use cantor_actuator::{ActuatorConfig, ActuatorDriver, MockDriver};
//! use cantor_core::{ChannelMap, MotionCurve};
//! use cantor_sync::{PlayerState, SyncPlayer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = MockDriver::with_configs(&[ActuatorConfig::new("servo1", 0)])?;
//! let mut player = SyncPlayer::new(driver);
//!
//! let mut curves = ChannelMap::new();
//! curves.insert("servo1".into(), MotionCurve::from_pairs([(0.0, 0.0), (1.0, 1.0)])?);
//! player.load(curves)?;
//! player.play()?;
//!
//! player.tick(0.5);
//! assert_eq!(player.driver().position(&"servo1".into()), Some(0.5));
//!
//! player.stop()?;
//! assert_eq!(player.state(), PlayerState::Stopped);
//! assert_eq!(player.driver().position(&"servo1".into()), Some(0.0));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod transport;
pub mod scheduler;
pub mod player;
pub mod session;

pub use error::{SyncError, SyncResult};
pub use transport::{ClockTransport, SteppedTransport, Transport};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerMode, SchedulerStats, TickInfo, DEFAULT_TICK_MS};
pub use player::{LoadReport, PlaybackSession, PlayerState, SyncPlayer};
pub use session::{run_session, SessionCommand, SessionEnd, SessionReport};
