//! Playback session: the tick loop between a transport and a player

use std::time::Instant;
use crossbeam_channel::{Receiver, TryRecvError};
use serde::Serialize;
use tracing::{debug, info, warn};
use cantor_actuator::ActuatorDriver;

use crate::error::{SyncError, SyncResult};
use crate::player::{PlayerState, SyncPlayer};
use crate::scheduler::{Scheduler, SchedulerStats};
use crate::transport::Transport;

/// Control messages accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    Stop,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEnd {
    /// The transport reported the end of the track
    Finished,
    /// A stop command arrived
    Interrupted,
}

/// Summary returned by [`run_session`]
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Ticks that dispatched positions
    pub ticks: u64,
    pub end: SessionEnd,
    /// Transport time of the last dispatched tick
    pub last_time: Option<f64>,
    pub stats: SchedulerStats,
}

/// Resets the player to closed when the loop exits by any path, unwinding
/// included.
struct ResetGuard<'a, D: ActuatorDriver> {
    player: &'a mut SyncPlayer<D>,
}

impl<D: ActuatorDriver> Drop for ResetGuard<'_, D> {
    fn drop(&mut self) {
        if self.player.state().is_active() {
            if let Err(err) = self.player.stop() {
                warn!(%err, "closing reset reported a driver failure");
            }
        }
    }
}

enum Control {
    Continue,
    Stop,
}

fn apply_commands<D: ActuatorDriver, T: Transport>(
    player: &mut SyncPlayer<D>,
    transport: &mut T,
    commands: &Receiver<SessionCommand>,
) -> Control {
    loop {
        let command = match commands.try_recv() {
            Ok(command) => command,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Control::Continue,
        };

        let result = match command {
            SessionCommand::Stop => return Control::Stop,
            SessionCommand::Pause => player.pause().map(|()| transport.pause()),
            SessionCommand::Resume => player.resume().map(|()| transport.resume()),
        };
        if let Err(err) = result {
            debug!(?command, %err, "command ignored");
        }
    }
}

/// Runs the tick loop until the track ends or a stop command arrives.
///
/// Each tick reads the transport time once, drains pending commands and
/// dispatches one batch. Whatever ends the loop, the player is left
/// `Stopped` with every channel closed.
pub fn run_session<D, T>(
    player: &mut SyncPlayer<D>,
    transport: &mut T,
    scheduler: &mut Scheduler,
    commands: &Receiver<SessionCommand>,
) -> SyncResult<SessionReport>
where
    D: ActuatorDriver,
    T: Transport,
{
    match player.state() {
        PlayerState::Loaded => player.play()?,
        PlayerState::Playing => {}
        state => {
            return Err(SyncError::InvalidState(format!(
                "cannot run a session while {}",
                state
            )));
        }
    }

    let mut guard = ResetGuard { player };
    let mut ticks = 0u64;
    let mut last_time = None;

    info!(tick_ms = scheduler.target_interval().as_millis() as u64, "session started");

    let end = loop {
        scheduler.wait_for_next_tick();

        if let Control::Stop = apply_commands(&mut *guard.player, transport, commands) {
            transport.stop();
            break SessionEnd::Interrupted;
        }
        if !transport.is_playing() {
            break SessionEnd::Finished;
        }
        if guard.player.state() == PlayerState::Paused {
            continue;
        }

        let started = Instant::now();
        let now = transport.position();
        if guard.player.tick(now) {
            ticks += 1;
            last_time = Some(now);
        }
        scheduler.record_execution_time(started.elapsed());
    };

    if let Err(err) = guard.player.stop() {
        warn!(%err, "closing reset reported a driver failure");
    }
    drop(guard);

    let stats = scheduler.stats();
    debug!(
        ticks = stats.tick_count,
        missed = stats.missed_ticks,
        avg_us = stats.avg_execution_time.as_micros() as u64,
        max_us = stats.max_execution_time.as_micros() as u64,
        "scheduler stats"
    );
    info!(?end, ticks, "session ended");

    Ok(SessionReport {
        ticks,
        end,
        last_time,
        stats,
    })
}
