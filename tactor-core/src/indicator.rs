//! Indicator light pulser
//!
//! A binary output that either holds a commanded level or free-runs a
//! blink at a configurable half-period. The orchestrator blinks it while
//! the wireless link is down and holds it solid while connected.

use crate::Ms;

/// On/off indicator with optional free-running pulse mode
#[derive(Debug, Clone)]
pub struct Indicator {
    level: bool,
    changed_at: Ms,
    pulse_mode: bool,
    half_period_ms: Ms,
}

impl Indicator {
    /// Create a new indicator, off, not pulsing
    pub fn new() -> Self {
        Self {
            level: false,
            changed_at: 0,
            pulse_mode: false,
            half_period_ms: 0,
        }
    }

    fn set_internal(&mut self, level: bool, now_ms: Ms) {
        self.level = level;
        self.changed_at = now_ms;
    }

    /// Set the level directly and cancel pulse mode
    pub fn set(&mut self, level: bool, now_ms: Ms) {
        self.set_internal(level, now_ms);
        self.pulse_mode = false;
    }

    /// Arm free-running blink mode without changing the visible level
    pub fn set_pulse(&mut self, half_period_ms: Ms) {
        self.pulse_mode = true;
        self.half_period_ms = half_period_ms;
    }

    /// Advance the blink; no-op unless in pulse mode
    pub fn update(&mut self, now_ms: Ms) {
        if !self.pulse_mode {
            return;
        }

        if now_ms.wrapping_sub(self.changed_at) >= self.half_period_ms {
            let next = !self.level;
            self.set_internal(next, now_ms);
        }
    }

    /// Current output level
    pub fn level(&self) -> bool {
        self.level
    }

    /// Whether blink mode is armed
    pub fn is_pulsing(&self) -> bool {
        self.pulse_mode
    }
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}
