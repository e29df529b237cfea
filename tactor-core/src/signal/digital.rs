//! Debounced digital signal monitor
//!
//! Edge detection is sampling-rate-bound: the caller's tick period is the
//! de facto debounce interval, so there is no separate debounce timer.
//! Events are latched until consumed, giving at-most-once delivery to
//! whoever polls.

use crate::Ms;

/// Minimum hold duration that gets reported; shorter holds are discarded.
pub const HOLD_REPORT_MIN_MS: Ms = 1000;

/// Electrical polarity of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// High level reads as true
    #[default]
    ActiveHigh,
    /// Low level reads as true (pulled-up input, switch to ground)
    ActiveLow,
}

/// Debounced boolean input with edge and latch semantics
///
/// `update()` must be called once per tick with the raw pin level.
/// The `take_*` accessors consume their event: reading returns the
/// latched value and resets it.
#[derive(Debug, Clone)]
pub struct DigitalSignal {
    polarity: Polarity,
    prev: bool,
    held_since: Ms,

    trap: bool,
    went_true: bool,
    went_false: bool,
    held_ms: Ms,
}

impl DigitalSignal {
    /// Create a new monitor; the line is assumed false until first sampled
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            prev: false,
            held_since: 0,
            trap: false,
            went_true: false,
            went_false: false,
            held_ms: 0,
        }
    }

    /// Sample the line and update edges and latches
    ///
    /// At most one of `went_true`/`went_false` is set by a single call.
    pub fn update(&mut self, raw_level: bool, now_ms: Ms) {
        let level = match self.polarity {
            Polarity::ActiveHigh => raw_level,
            Polarity::ActiveLow => !raw_level,
        };

        if level {
            self.trap = true;
        }

        if !self.prev && level {
            self.went_true = true;
            self.held_since = now_ms;
        }

        if self.prev && !level {
            self.went_false = true;
            let held = now_ms.wrapping_sub(self.held_since);
            if held >= HOLD_REPORT_MIN_MS {
                self.held_ms = held;
            }
        }

        self.prev = level;
    }

    /// Adopt the current line level without emitting edge events
    ///
    /// Clears any latched edges and hold. Used when the line was not
    /// sampled for a while and its history is stale, so the gap cannot
    /// manufacture an edge.
    pub fn resync(&mut self, raw_level: bool, now_ms: Ms) {
        let level = match self.polarity {
            Polarity::ActiveHigh => raw_level,
            Polarity::ActiveLow => !raw_level,
        };

        if level {
            self.trap = true;
        }

        self.prev = level;
        self.held_since = now_ms;
        self.went_true = false;
        self.went_false = false;
        self.held_ms = 0;
    }

    /// Current debounced level (after polarity inversion)
    pub fn level(&self) -> bool {
        self.prev
    }

    /// Sticky "has ever read true" witness; never clears
    pub fn trap(&self) -> bool {
        self.trap
    }

    /// Consume the false-to-true edge event
    pub fn take_went_true(&mut self) -> bool {
        core::mem::take(&mut self.went_true)
    }

    /// Consume the true-to-false edge event
    pub fn take_went_false(&mut self) -> bool {
        core::mem::take(&mut self.went_false)
    }

    /// Consume the latched hold duration
    ///
    /// Non-zero only when the preceding true-phase lasted at least
    /// [`HOLD_REPORT_MIN_MS`].
    pub fn take_held_ms(&mut self) -> Ms {
        core::mem::take(&mut self.held_ms)
    }
}
