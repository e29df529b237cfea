//! Motor pulse state machine
//!
//! Converts a requested pulse duration into a timed forward -> reverse ->
//! brake drive sequence on an H-bridge driver. The sequencer owns its own
//! timing and the driver's fault line; all transitions are deadline-based
//! (`now >= deadline`), never duration-counted, so a late tick fires the
//! overdue transition retroactively instead of corrupting timing.
//!
//! The sequencer is pure logic: it emits the PWM channel levels to apply
//! and the caller writes them to hardware.

use crate::signal::{DigitalSignal, Polarity};
use crate::Ms;

/// Duty level used for the reverse kick and the electronic brake
const FULL_DUTY: u8 = 255;

/// Pulses requested this soon after the previous cycle get damped
pub const DAMPING_WINDOW_MS: Ms = 200;

/// Requests at or below this duration are never damped
pub const DAMPING_MIN_MS: Ms = 10;

/// Motor drive sequence states, advanced strictly in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    /// Outputs idle, ready to accept a pulse
    #[default]
    Asleep,
    /// Driving forward at the configured duty
    Forward,
    /// Full-duty reverse kick to stop the inertia
    Reverse,
    /// Both legs high, electronic brake
    Brake,
}

/// Motor tuning parameters, swappable at any time for field calibration
///
/// Denominators split a requested duration into brake and reverse budgets;
/// the caps bound each budget regardless of pulse length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorParameters {
    /// Forward-phase PWM duty (0-255)
    pub pwm: u8,
    /// Reverse budget = remaining duration / this
    pub reverse_denominator: Ms,
    /// Upper bound on the reverse budget (ms)
    pub reverse_ms_max: Ms,
    /// Brake budget = requested duration / this
    pub brake_denominator: Ms,
    /// Upper bound on the brake budget (ms)
    pub brake_ms_max: Ms,
}

impl Default for MotorParameters {
    /// Bench-tuned values for the shipped motor
    fn default() -> Self {
        Self {
            pwm: 254,
            reverse_denominator: 5,
            reverse_ms_max: 8,
            brake_denominator: 3,
            brake_ms_max: 90,
        }
    }
}

/// PWM levels for the two H-bridge legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmLevels {
    /// First leg duty (0-255)
    pub a: u8,
    /// Second leg duty (0-255)
    pub b: u8,
}

impl PwmLevels {
    /// Both legs off
    pub const OFF: Self = Self { a: 0, b: 0 };
}

/// Result of one sequencer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorUpdate {
    /// New drive levels to apply, if a transition fired
    pub drive: Option<PwmLevels>,
    /// The fault line was asserted since the last tick (reported once)
    pub fault_raised: bool,
}

/// The timed drive sequencer
///
/// Owns the fault line monitor. The fault trap is a hard safety override
/// layered beneath the state logic: once set, every emitted drive is forced
/// to zero on both legs, while the sequencer keeps advancing so it stays
/// internally consistent. The trap has no software reset path.
#[derive(Debug, Clone)]
pub struct Motor {
    fault: DigitalSignal,
    parameters: MotorParameters,

    state: MotorState,
    reverse_ms: Ms,
    brake_ms: Ms,
    deadline: Ms,
    last_activation: Ms,
}

impl Motor {
    /// Create an idle sequencer
    ///
    /// The fault line is active-low (driver pulls it to ground on fault).
    pub fn new(parameters: MotorParameters) -> Self {
        Self {
            fault: DigitalSignal::new(Polarity::ActiveLow),
            parameters,
            state: MotorState::Asleep,
            reverse_ms: 0,
            brake_ms: 0,
            deadline: 0,
            last_activation: 0,
        }
    }

    /// Current sequence state
    pub fn state(&self) -> MotorState {
        self.state
    }

    /// Whether the fault latch is set
    pub fn fault_trapped(&self) -> bool {
        self.fault.trap()
    }

    /// Current tuning parameters
    pub fn parameters(&self) -> MotorParameters {
        self.parameters
    }

    /// Swap tuning parameters; takes effect at the next pulse
    pub fn set_parameters(&mut self, parameters: MotorParameters) {
        self.parameters = parameters;
    }

    /// Clamp a drive command through the fault interlock
    fn drive(&self, levels: PwmLevels) -> PwmLevels {
        if self.fault.trap() {
            return PwmLevels::OFF;
        }
        levels
    }

    /// Request one pulse cycle of roughly `ms` milliseconds
    ///
    /// No-op unless asleep ("last requester loses"). Rapid re-triggers are
    /// damped: a non-trivial request arriving within [`DAMPING_WINDOW_MS`]
    /// of the previous cycle's completion runs at half duration plus one.
    ///
    /// Returns the forward drive levels to apply, already interlocked.
    pub fn pulse(&mut self, ms: Ms, now_ms: Ms) -> Option<PwmLevels> {
        if self.state != MotorState::Asleep {
            return None;
        }

        let mut ms = ms;
        if ms > DAMPING_MIN_MS && now_ms.wrapping_sub(self.last_activation) < DAMPING_WINDOW_MS {
            ms = ms / 2 + 1;
        }

        let p = self.parameters;

        self.brake_ms = (ms / p.brake_denominator.max(1)).min(p.brake_ms_max);
        ms -= self.brake_ms;

        self.reverse_ms = (ms / p.reverse_denominator.max(1)).min(p.reverse_ms_max);
        ms -= self.reverse_ms;

        // Leftover is the forward budget
        self.deadline = now_ms.wrapping_add(ms);
        self.state = MotorState::Forward;

        Some(self.drive(PwmLevels { a: p.pwm, b: 0 }))
    }

    /// Per-tick update: re-evaluate the fault line, advance at most one state
    ///
    /// `fault_level` is the raw level of the driver's fault pin.
    pub fn update(&mut self, fault_level: bool, now_ms: Ms) -> MotorUpdate {
        self.fault.update(fault_level, now_ms);
        let fault_raised = self.fault.take_went_true();

        if self.state == MotorState::Asleep || (now_ms.wrapping_sub(self.deadline) as i32) < 0 {
            return MotorUpdate {
                drive: None,
                fault_raised,
            };
        }

        let levels = match self.state {
            MotorState::Forward => {
                self.deadline = now_ms.wrapping_add(self.reverse_ms);
                self.state = MotorState::Reverse;
                PwmLevels { a: 0, b: FULL_DUTY }
            }
            MotorState::Reverse => {
                self.deadline = now_ms.wrapping_add(self.brake_ms);
                self.state = MotorState::Brake;
                PwmLevels {
                    a: FULL_DUTY,
                    b: FULL_DUTY,
                }
            }
            MotorState::Brake => {
                self.last_activation = now_ms;
                self.state = MotorState::Asleep;
                PwmLevels::OFF
            }
            MotorState::Asleep => unreachable!(),
        };

        MotorUpdate {
            drive: Some(self.drive(levels)),
            fault_raised,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec;
    use std::vec::Vec;

    /// Fault line is active-low: high means healthy
    const HEALTHY: bool = true;
    const FAULTED: bool = false;

    fn motor() -> Motor {
        Motor::new(MotorParameters::default())
    }

    /// Run a full cycle and return the visited (state, drive) transitions
    fn run_cycle(motor: &mut Motor, ms: Ms, start: Ms) -> Vec<(MotorState, PwmLevels)> {
        let mut visited = Vec::new();
        let fwd = motor.pulse(ms, start).expect("pulse accepted");
        visited.push((motor.state(), fwd));

        let mut now = start;
        while motor.state() != MotorState::Asleep {
            now += 1;
            let out = motor.update(HEALTHY, now);
            if let Some(drive) = out.drive {
                visited.push((motor.state(), drive));
            }
            assert!(now < start + 10_000, "cycle never completed");
        }
        visited
    }

    #[test]
    fn test_reference_split() {
        // pulse(30), denominators {reverse: 5, brake: 3}, caps {8, 90}:
        // brake = 10, reverse = 4, forward = 16
        let mut m = motor();
        let drive = m.pulse(30, 1000).unwrap();

        assert_eq!(drive, PwmLevels { a: 254, b: 0 });
        assert_eq!(m.state(), MotorState::Forward);
        assert_eq!(m.brake_ms, 10);
        assert_eq!(m.reverse_ms, 4);
        assert_eq!(m.deadline, 1016);
    }

    #[test]
    fn test_full_cycle_order_and_timing() {
        let mut m = motor();

        // Forward until 1016, reverse until 1020, brake until 1030
        let visited = run_cycle(&mut m, 30, 1000);
        assert_eq!(
            visited,
            vec![
                (MotorState::Forward, PwmLevels { a: 254, b: 0 }),
                (MotorState::Reverse, PwmLevels { a: 0, b: 255 }),
                (MotorState::Brake, PwmLevels { a: 255, b: 255 }),
                (MotorState::Asleep, PwmLevels::OFF),
            ]
        );
        assert_eq!(m.last_activation, 1030);
    }

    #[test]
    fn test_no_transition_before_deadline() {
        let mut m = motor();
        m.pulse(30, 1000);

        for now in 1001..1016 {
            let out = m.update(HEALTHY, now);
            assert_eq!(out.drive, None);
            assert_eq!(m.state(), MotorState::Forward);
        }

        let out = m.update(HEALTHY, 1016);
        assert!(out.drive.is_some());
        assert_eq!(m.state(), MotorState::Reverse);
    }

    #[test]
    fn test_pulse_rejected_while_running() {
        let mut m = motor();
        assert!(m.pulse(30, 1000).is_some());
        assert!(m.pulse(30, 1001).is_none());
        assert_eq!(m.state(), MotorState::Forward);
    }

    #[test]
    fn test_damping_within_window() {
        let mut m = motor();
        run_cycle(&mut m, 40, 1000); // completes at some t0

        let t0 = m.last_activation;

        // 50ms later: 40 becomes 40/2 + 1 = 21 -> brake 7, reverse 2, forward 12
        m.pulse(40, t0 + 50).unwrap();
        assert_eq!(m.brake_ms, 7);
        assert_eq!(m.reverse_ms, 2);
        assert_eq!(m.deadline, t0 + 50 + 12);
    }

    #[test]
    fn test_no_damping_after_window() {
        let mut m = motor();
        run_cycle(&mut m, 40, 1000);
        let t0 = m.last_activation;

        // 200ms is outside the window: full 40 -> brake 13, reverse 5
        m.pulse(40, t0 + 200).unwrap();
        assert_eq!(m.brake_ms, 13);
        assert_eq!(m.reverse_ms, 5);
    }

    #[test]
    fn test_trivial_pulse_not_damped() {
        let mut m = motor();
        run_cycle(&mut m, 40, 1000);
        let t0 = m.last_activation;

        // <= 10ms requests pass through undamped even back-to-back
        m.pulse(9, t0 + 10).unwrap();
        assert_eq!(m.brake_ms, 3);
        assert_eq!(m.reverse_ms, 1);
        assert_eq!(m.deadline, t0 + 10 + 5);
    }

    #[test]
    fn test_caps_respected() {
        let mut m = motor();

        // 1000ms: brake would be 333, reverse 182 without caps
        m.pulse(1000, 100_000).unwrap();
        assert_eq!(m.brake_ms, 90);
        assert_eq!(m.reverse_ms, 8);
        assert_eq!(m.deadline, 100_000 + 902);
    }

    #[test]
    fn test_fault_zeroes_all_drives() {
        let mut m = motor();

        // Latch the fault, then request a pulse
        let out = m.update(FAULTED, 1000);
        assert!(out.fault_raised);
        assert!(m.fault_trapped());

        let fwd = m.pulse(30, 1001).unwrap();
        assert_eq!(fwd, PwmLevels::OFF);

        // Sequencer keeps cycling, every drive stays zero
        let mut now = 1001;
        while m.state() != MotorState::Asleep {
            now += 1;
            let out = m.update(HEALTHY, now); // line recovered, trap stays
            if let Some(drive) = out.drive {
                assert_eq!(drive, PwmLevels::OFF);
            }
        }
        assert!(m.fault_trapped());
    }

    #[test]
    fn test_fault_reported_once() {
        let mut m = motor();

        let out = m.update(FAULTED, 1000);
        assert!(out.fault_raised);

        // Still asserted: no repeat report
        let out = m.update(FAULTED, 1001);
        assert!(!out.fault_raised);
    }

    #[test]
    fn test_late_ticks_fire_transitions_retroactively() {
        let mut m = motor();
        m.pulse(30, 1000);

        // Scheduler stalls way past every deadline; each update still
        // advances exactly one state
        let out = m.update(HEALTHY, 5000);
        assert_eq!(m.state(), MotorState::Reverse);
        assert_eq!(out.drive, Some(PwmLevels { a: 0, b: 255 }));

        m.update(HEALTHY, 6000);
        assert_eq!(m.state(), MotorState::Brake);

        m.update(HEALTHY, 7000);
        assert_eq!(m.state(), MotorState::Asleep);
    }

    #[test]
    fn test_zero_denominator_clamped() {
        let mut m = Motor::new(MotorParameters {
            pwm: 254,
            reverse_denominator: 0,
            reverse_ms_max: 8,
            brake_denominator: 0,
            brake_ms_max: 90,
        });

        // Divide-by-zero parameters behave like denominator 1
        m.pulse(30, 1000).unwrap();
        assert_eq!(m.brake_ms, 30);
        assert_eq!(m.reverse_ms, 0);
    }

    proptest! {
        #[test]
        fn prop_split_budgets_within_request(
            ms in 0u32..=10_000,
            rev_den in 1u32..=16,
            rev_max in 0u32..=500,
            brake_den in 1u32..=16,
            brake_max in 0u32..=500,
        ) {
            let mut m = Motor::new(MotorParameters {
                pwm: 254,
                reverse_denominator: rev_den,
                reverse_ms_max: rev_max,
                brake_denominator: brake_den,
                brake_ms_max: brake_max,
            });

            // Start well past boot so the damping window cannot trigger
            m.pulse(ms, 1_000_000).unwrap();

            prop_assert!(m.brake_ms <= brake_max);
            prop_assert!(m.reverse_ms <= rev_max);
            prop_assert!(m.brake_ms + m.reverse_ms <= ms);

            let forward = m.deadline.wrapping_sub(1_000_000);
            prop_assert_eq!(forward + m.brake_ms + m.reverse_ms, ms);
        }
    }
}
