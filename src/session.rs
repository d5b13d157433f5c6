//! Session state machine
//!
//! ```text
//! Idle --start--> Countdown --3s--> Running <--pause/resume--> Paused
//!                                      |                         |
//!                                      +------ hit / time up ----+--> Ended
//! Ended --reset--> Idle
//! ```
//!
//! The session owns the active-time [`Clock`], so every transition that
//! touches pausing also keeps the clock's paused accumulator right. The help
//! overlay is tracked separately from `Paused`: opening it pauses a running
//! game, and closing it resumes only if the game wasn't already paused.
//!
//! Requests that don't apply in the current phase are ignored and return
//! `false`.

use serde::{Deserialize, Serialize};

use crate::consts::COUNTDOWN_MS;
use crate::sim::Clock;

/// How a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Touched an enemy without a shield
    Loss,
    /// Survived a timed mode to the limit
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Countdown { started_at: f64 },
    Running,
    Paused,
    Ended { outcome: SessionOutcome },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Countdown { .. } => "countdown",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Ended { .. } => "ended",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    phase: SessionPhase,
    clock: Clock,
    countdown_ms: f64,
    overlay_open: bool,
    paused_before_overlay: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            clock: Clock::default(),
            countdown_ms: COUNTDOWN_MS,
            overlay_open: false,
            paused_before_overlay: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }

    /// Countdown, Running or Paused
    pub fn in_run(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Countdown { .. } | SessionPhase::Running | SessionPhase::Paused
        )
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.phase {
            SessionPhase::Ended { outcome } => Some(outcome),
            _ => None,
        }
    }

    /// Idle -> Countdown. Refused while the help overlay is open.
    pub fn start(&mut self, now: f64) -> bool {
        if self.phase != SessionPhase::Idle || self.overlay_open {
            return false;
        }
        self.phase = SessionPhase::Countdown { started_at: now };
        log::info!("Countdown started");
        true
    }

    /// Countdown -> Running once the countdown has elapsed. Stamps the clock.
    pub fn update_countdown(&mut self, now: f64) -> bool {
        let SessionPhase::Countdown { started_at } = self.phase else {
            return false;
        };
        if now - started_at < self.countdown_ms {
            return false;
        }
        self.clock.start(now);
        self.phase = SessionPhase::Running;
        log::info!("Run started");
        true
    }

    /// Whole seconds left on the countdown (3, 2, 1)
    pub fn countdown_remaining(&self, now: f64) -> Option<u32> {
        let SessionPhase::Countdown { started_at } = self.phase else {
            return None;
        };
        let left = (self.countdown_ms - (now - started_at)).max(0.0);
        Some(((left / 1000.0).ceil() as u32).max(1))
    }

    pub fn pause(&mut self, now: f64) -> bool {
        if self.phase != SessionPhase::Running || !self.clock.pause(now) {
            return false;
        }
        self.phase = SessionPhase::Paused;
        log::debug!("Paused at {:.0}ms active", self.clock.elapsed_active_ms(now));
        true
    }

    /// Paused -> Running. Refused while the overlay covers the game.
    pub fn resume(&mut self, now: f64) -> bool {
        if self.phase != SessionPhase::Paused || self.overlay_open || !self.clock.resume(now) {
            return false;
        }
        self.phase = SessionPhase::Running;
        log::debug!("Resumed");
        true
    }

    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.phase {
            SessionPhase::Running => self.pause(now),
            SessionPhase::Paused => self.resume(now),
            _ => false,
        }
    }

    pub fn open_overlay(&mut self, now: f64) -> bool {
        if self.overlay_open {
            return false;
        }
        self.overlay_open = true;
        self.paused_before_overlay = self.is_paused();
        if self.is_running() {
            self.pause(now);
        }
        log::debug!("Overlay opened (was paused: {})", self.paused_before_overlay);
        true
    }

    pub fn close_overlay(&mut self, now: f64) -> bool {
        if !self.overlay_open {
            return false;
        }
        self.overlay_open = false;
        if self.is_paused() && !self.paused_before_overlay {
            self.resume(now);
        }
        self.paused_before_overlay = false;
        log::debug!("Overlay closed");
        true
    }

    /// Running/Paused -> Ended. Freezes the clock.
    pub fn end(&mut self, now: f64, outcome: SessionOutcome) -> bool {
        if !matches!(self.phase, SessionPhase::Running | SessionPhase::Paused) {
            return false;
        }
        self.clock.stop(now);
        self.phase = SessionPhase::Ended { outcome };
        true
    }

    /// Back to Idle from any phase. Never starts a new run on its own.
    pub fn reset(&mut self, now: f64) -> bool {
        if self.phase == SessionPhase::Idle {
            return false;
        }
        self.clock.stop(now);
        self.phase = SessionPhase::Idle;
        log::info!("Session reset");
        true
    }
}
