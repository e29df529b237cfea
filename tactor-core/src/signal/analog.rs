//! Averaged analog signal monitor
//!
//! Tracks the moving envelope of a smoothed ADC value and derives discrete
//! activation events from it. Activations are edge-triggered on the
//! envelope *span*, not on the level: once an activation fires, the
//! envelope collapses to the current average, so a held-still input cannot
//! repeat-fire no matter how far it sits from rest.

use crate::Ms;

/// Full scale of the 12-bit ADC
pub const ADC_FULL_SCALE: u16 = (1 << 12) - 1;

/// One percent of full scale, in ADC counts
pub const ADC_PERCENT: u16 = ADC_FULL_SCALE / 100;

/// Averaged/enveloped input producing threshold-crossing activations
///
/// `N` is the averaging window length in samples. `N = 1` disables
/// smoothing and tracks the envelope of the raw signal directly.
#[derive(Debug, Clone)]
pub struct AnalogSignal<const N: usize> {
    samples: [u16; N],
    last_written: usize,
    sum: u32,

    low: u16,
    high: u16,

    activation_at: Ms,
    double_armed: bool,
}

impl<const N: usize> Default for AnalogSignal<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AnalogSignal<N> {
    /// Create a new monitor with an empty (all-zero) window
    ///
    /// Call [`prime`](Self::prime) with a real reading before the first
    /// tick, otherwise the first activations measure against zero.
    pub fn new() -> Self {
        const { assert!(N >= 1, "averaging window must hold at least one sample") };
        Self {
            samples: [0; N],
            last_written: N - 1,
            sum: 0,
            low: 0,
            high: 0,
            activation_at: 0,
            double_armed: false,
        }
    }

    fn push(&mut self, raw: u16) {
        let mut next = 0;
        if self.last_written < N - 1 {
            next = self.last_written + 1;
        }

        self.sum -= u32::from(self.samples[next]);
        self.samples[next] = raw;
        self.sum += u32::from(raw);
        self.last_written = next;
    }

    fn reset_envelope(&mut self) {
        let avg = self.average();
        self.low = avg;
        self.high = avg;
    }

    /// Current averaged value
    pub fn average(&self) -> u16 {
        (self.sum / N as u32) as u16
    }

    /// Envelope spanned by the averaged signal since the last reset
    pub fn envelope(&self) -> (u16, u16) {
        (self.low, self.high)
    }

    /// Fill the whole window with a reading and collapse the envelope
    ///
    /// Used at init and whenever the signal source is (re)attached, so a
    /// stale envelope cannot fire a spurious activation.
    pub fn prime(&mut self, raw: u16) {
        for _ in 0..N {
            self.push(raw);
        }
        self.reset_envelope();
    }

    /// Append a fresh sample and extend the envelope
    pub fn update(&mut self, raw: u16) {
        self.push(raw);
        let avg = self.average();

        if avg < self.low {
            self.low = avg;
        }
        if avg > self.high {
            self.high = avg;
        }
    }

    /// Primary activation: envelope span crossed the threshold
    ///
    /// `threshold_percent` is clamped to [0, 100] and compared against the
    /// span as a percentage of full scale. Fires at most once per envelope
    /// excursion: on success the envelope collapses to the current average,
    /// the activation timestamp is recorded, and the secondary trigger is
    /// armed.
    pub fn active(&mut self, threshold_percent: u16, now_ms: Ms) -> bool {
        let threshold = threshold_percent.min(100);

        let span = self.high - self.low;
        if span / ADC_PERCENT < threshold {
            return false;
        }

        self.reset_envelope();
        self.activation_at = now_ms;
        self.double_armed = true;
        true
    }

    /// Secondary activation: one-shot delayed follow-up to a primary
    ///
    /// Armed exactly once per primary activation; fires on the first poll
    /// made strictly after `window_ms` has elapsed since that activation,
    /// then disarms. Detects a deliberate second gesture shortly after the
    /// first.
    pub fn active2(&mut self, window_ms: Ms, now_ms: Ms) -> bool {
        if !self.double_armed {
            return false;
        }

        if now_ms.wrapping_sub(self.activation_at) > window_ms {
            self.double_armed = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Window of 4 keeps the expected averages easy to compute by hand
    type Dial = AnalogSignal<4>;

    #[test]
    fn test_prime_collapses_envelope() {
        let mut dial = Dial::new();
        dial.prime(2000);

        assert_eq!(dial.average(), 2000);
        assert_eq!(dial.envelope(), (2000, 2000));
    }

    #[test]
    fn test_envelope_tracks_min_and_max() {
        let mut dial = Dial::new();
        dial.prime(2000);

        dial.update(2400); // avg 2100
        dial.update(1200); // avg pulled down
        let (low, high) = dial.envelope();
        assert!(high >= 2100);
        assert!(low < 2000);
        assert!(high >= low);
    }

    #[test]
    fn test_active_fires_once_per_excursion() {
        let mut dial = Dial::new();
        dial.prime(1000);

        // Sweep the dial hard: 50% of full scale
        for _ in 0..4 {
            dial.update(3200);
        }

        assert!(dial.active(20, 100));
        // Envelope collapsed: same call cannot fire again
        assert!(!dial.active(20, 101));
        let (low, high) = dial.envelope();
        assert_eq!(low, high);

        // Holding still never re-fires
        for t in 0..50 {
            dial.update(3200);
            assert!(!dial.active(20, 102 + t));
        }
    }

    #[test]
    fn test_small_span_does_not_fire() {
        let mut dial = Dial::new();
        dial.prime(2000);

        dial.update(2100); // ~2.5% movement
        assert!(!dial.active(20, 10));
    }

    #[test]
    fn test_threshold_clamped_to_100() {
        let mut dial = Dial::new();
        dial.prime(0);

        for _ in 0..4 {
            dial.update(ADC_FULL_SCALE);
        }

        // Absurd threshold behaves like 100%
        assert!(dial.active(5000, 10));
    }

    #[test]
    fn test_active2_fires_once_after_window() {
        let mut dial = Dial::new();
        dial.prime(1000);

        // Unarmed: never fires
        assert!(!dial.active2(300, 10_000));

        for _ in 0..4 {
            dial.update(3200);
        }
        assert!(dial.active(20, 1000));

        // Too early
        assert!(!dial.active2(300, 1100));
        assert!(!dial.active2(300, 1300));

        // First poll past the window fires, then disarms
        assert!(dial.active2(300, 1301));
        assert!(!dial.active2(300, 1302));
        assert!(!dial.active2(300, 9999));
    }

    #[test]
    fn test_active2_rearmed_by_next_primary() {
        let mut dial = Dial::new();
        dial.prime(1000);

        for _ in 0..4 {
            dial.update(3200);
        }
        assert!(dial.active(20, 1000));
        assert!(dial.active2(300, 1400));

        // New excursion re-arms
        for _ in 0..4 {
            dial.update(500);
        }
        assert!(dial.active(20, 2000));
        assert!(dial.active2(300, 2400));
    }

    #[test]
    fn test_window_of_one_is_unsmoothed() {
        let mut dial: AnalogSignal<1> = AnalogSignal::new();
        dial.prime(2000);
        dial.update(3000);
        assert_eq!(dial.average(), 3000);
        assert_eq!(dial.envelope(), (2000, 3000));
    }
}
