//! Pause-aware active-time clock
//!
//! Tracks how much non-paused time has passed since a run started. Paused
//! intervals are folded into an accumulator on resume, so elapsed time never
//! jumps when play continues.

use serde::{Deserialize, Serialize};

/// Active-time clock driven by a monotonic millisecond time source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clock {
    running: bool,
    paused: bool,
    /// Instant the run became active (ms)
    active_start: f64,
    /// Total time spent paused since `active_start` (ms)
    accumulated_paused: f64,
    /// Instant the current pause began (ms), meaningful while `paused`
    pause_start: f64,
    /// Instant the run was stopped (ms), meaningful once stopped
    stop_time: f64,
    started: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin active timing at `now`, clearing the pause accumulator
    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.paused = false;
        self.active_start = now;
        self.accumulated_paused = 0.0;
        self.pause_start = 0.0;
        self.stop_time = 0.0;
        self.started = true;
    }

    /// Stop timing. A pending pause is folded in first, so the reading stays
    /// frozen at the active time reached before the pause.
    pub fn stop(&mut self, now: f64) {
        if !self.running {
            return;
        }
        self.resume(now);
        self.running = false;
        self.stop_time = now;
    }

    /// Freeze active time. Returns false (no-op) if not running or already paused.
    pub fn pause(&mut self, now: f64) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.paused = true;
        self.pause_start = now;
        true
    }

    /// Continue active time. Returns false (no-op) if not paused.
    pub fn resume(&mut self, now: f64) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.accumulated_paused += (now - self.pause_start).max(0.0);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Active milliseconds at `now`. While paused the reading is frozen at the
    /// pause instant, after `stop` at the stop instant; before `start` it is zero.
    pub fn elapsed_active_ms(&self, now: f64) -> f64 {
        if !self.started {
            return 0.0;
        }
        let effective_now = if self.paused {
            self.pause_start
        } else if !self.running {
            self.stop_time
        } else {
            now
        };
        (effective_now - self.active_start - self.accumulated_paused).max(0.0)
    }

    pub fn elapsed_active_secs(&self, now: f64) -> f64 {
        self.elapsed_active_ms(now) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_excludes_pauses() {
        let mut clock = Clock::new();
        clock.start(1000.0);
        assert_eq!(clock.elapsed_active_ms(1500.0), 500.0);

        assert!(clock.pause(1500.0));
        // Frozen while paused
        assert_eq!(clock.elapsed_active_ms(4000.0), 500.0);
        assert!(clock.resume(4000.0));
        assert_eq!(clock.elapsed_active_ms(4250.0), 750.0);
    }

    #[test]
    fn test_misuse_is_noop() {
        let mut clock = Clock::new();
        assert!(!clock.pause(10.0), "pause before start");
        assert!(!clock.resume(10.0), "resume before pause");

        clock.start(100.0);
        assert!(clock.pause(200.0));
        assert!(!clock.pause(300.0), "double pause");
        assert!(clock.resume(400.0));
        assert!(!clock.resume(500.0), "double resume");
        assert_eq!(clock.elapsed_active_ms(500.0), 200.0);
    }

    #[test]
    fn test_start_resets_accumulator() {
        let mut clock = Clock::new();
        clock.start(0.0);
        clock.pause(100.0);
        clock.resume(900.0);
        clock.start(1000.0);
        assert_eq!(clock.elapsed_active_ms(1100.0), 100.0);
    }

    #[test]
    fn test_stop_while_paused_keeps_reading() {
        let mut clock = Clock::new();
        clock.start(0.0);
        clock.pause(300.0);
        clock.stop(800.0);
        assert!(!clock.is_paused());
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_active_ms(800.0), 300.0);
        assert_eq!(clock.elapsed_active_ms(5000.0), 300.0);
    }

    #[test]
    fn test_elapsed_before_start_is_zero() {
        let clock = Clock::new();
        assert_eq!(clock.elapsed_active_ms(12345.0), 0.0);
    }
}
