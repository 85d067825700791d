use std::{cell::Cell, fmt, rc::Rc, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{KaraokeError, Result};

/// Source of wall-clock time in seconds. Only differences between readings
/// are meaningful.
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Real time, measured from when the source was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    epoch: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Hand-driven time. Clones share the same reading, so a test can keep one
/// handle while the clock owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<f64>>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockPhase {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for ClockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Snapshot of the clock bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub phase: ClockPhase,
    pub origin_wall_time: Option<f64>,
    pub accumulated_paused_duration: f64,
    pub last_known_position: f64,
}

/// Pausable, seekable playback clock.
///
/// While playing, the position is `now - origin - paused`, where `paused`
/// sums every interval spent in [`ClockPhase::Paused`]. Outside of playback
/// the position is frozen at the last known value. Calls made in the wrong
/// phase return [`KaraokeError::InvalidTransition`] and change nothing.
#[derive(Debug, Clone)]
pub struct SyncClock<T = MonotonicTimeSource> {
    source: T,
    state: ClockState,
    paused_at: Option<f64>,
}

impl SyncClock<MonotonicTimeSource> {
    pub fn new() -> Self {
        Self::with_source(MonotonicTimeSource::new())
    }
}

impl Default for SyncClock<MonotonicTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> SyncClock<T> {
    pub fn with_source(source: T) -> Self {
        Self {
            source,
            state: ClockState::default(),
            paused_at: None,
        }
    }

    pub fn phase(&self) -> ClockPhase {
        self.state.phase
    }

    pub fn is_playing(&self) -> bool {
        self.state.phase == ClockPhase::Playing
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn start(&mut self) -> Result<()> {
        self.expect_phase("start", ClockPhase::Stopped)?;
        self.state = ClockState {
            phase: ClockPhase::Playing,
            origin_wall_time: Some(self.source.now()),
            accumulated_paused_duration: 0.0,
            last_known_position: 0.0,
        };
        tracing::debug!("clock started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.expect_phase("pause", ClockPhase::Playing)?;
        self.state.last_known_position = self.current_position();
        self.state.phase = ClockPhase::Paused;
        self.paused_at = Some(self.source.now());
        tracing::debug!(position = self.state.last_known_position, "clock paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.expect_phase("resume", ClockPhase::Paused)?;
        let now = self.source.now();
        if let Some(paused_at) = self.paused_at.take() {
            self.state.accumulated_paused_duration += now - paused_at;
        }
        self.state.phase = ClockPhase::Playing;
        tracing::debug!(position = self.current_position(), "clock resumed");
        Ok(())
    }

    /// Moves the position to `position` (clamped to be non-negative) without
    /// changing the phase. Not allowed while stopped.
    pub fn seek(&mut self, position: f64) -> Result<()> {
        if self.state.phase == ClockPhase::Stopped {
            return Err(self.invalid("seek"));
        }
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        let now = self.source.now();

        self.state.last_known_position = position;
        self.state.accumulated_paused_duration = 0.0;
        match self.state.phase {
            ClockPhase::Playing => {
                self.state.origin_wall_time = Some(now - position);
            }
            // Anchor to the pause instant so that resuming continues here.
            _ => {
                let paused_at = *self.paused_at.get_or_insert(now);
                self.state.origin_wall_time = Some(paused_at - position);
            }
        }
        tracing::debug!(position, phase = %self.state.phase, "clock seeked");
        Ok(())
    }

    /// Returns to [`ClockPhase::Stopped`] and clears all bookkeeping. Always
    /// succeeds.
    pub fn stop(&mut self) {
        if self.state.phase != ClockPhase::Stopped {
            tracing::debug!(position = self.current_position(), "clock stopped");
        }
        self.state = ClockState::default();
        self.paused_at = None;
    }

    /// Current playback position in seconds, never negative.
    pub fn current_position(&self) -> f64 {
        let position = match (self.state.phase, self.state.origin_wall_time) {
            (ClockPhase::Playing, Some(origin)) => {
                self.source.now() - origin - self.state.accumulated_paused_duration
            }
            _ => self.state.last_known_position,
        };
        position.max(0.0)
    }

    fn expect_phase(&self, operation: &'static str, phase: ClockPhase) -> Result<()> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> KaraokeError {
        tracing::debug!(operation, phase = %self.state.phase, "ignored clock transition");
        KaraokeError::InvalidTransition {
            operation,
            phase: self.state.phase,
        }
    }
}
