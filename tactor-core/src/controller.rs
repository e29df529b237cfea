//! Per-tick orchestrator
//!
//! Runs every component's update in a fixed order once per tick and
//! derives at most one motor pulse decision per tick. The tick period must
//! be short enough that human button presses span many ticks (1 ms on the
//! reference hardware); it is also the debounce interval of every digital
//! input.

use crate::indicator::Indicator;
use crate::link::LinkState;
use crate::motor::{Motor, MotorParameters, MotorState, PwmLevels};
use crate::signal::{AnalogSignal, DigitalSignal, Polarity};
use crate::Ms;

/// Averaging window of the accessory dial, in samples (= ticks)
pub const DIAL_AVERAGING_WINDOW: usize = 64;

/// Fixed pulse-decision policy
///
/// These are part of the device's control contract, tuned on hardware;
/// they are swappable as a block for bench work but are not meant as a
/// generic configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulsePolicy {
    /// Pulse issued when the accessory button becomes active
    pub press_ms: Ms,
    /// Pulse issued when the accessory button is released
    pub release_ms: Ms,
    /// Pulse issued on a dial activation (primary or secondary)
    pub dial_ms: Ms,
    /// Envelope span threshold for a dial activation, percent of full scale
    pub dial_threshold_percent: u16,
    /// Delay after a primary dial activation before the secondary fires
    pub dial_double_window_ms: Ms,
    /// Indicator blink half-period while disconnected
    pub blink_half_period_ms: Ms,
}

impl Default for PulsePolicy {
    fn default() -> Self {
        Self {
            press_ms: 30,
            release_ms: 20,
            dial_ms: 30,
            dial_threshold_percent: 20,
            dial_double_window_ms: 400,
            blink_half_period_ms: 500,
        }
    }
}

/// Raw hardware levels sampled by the caller at the top of the tick
#[derive(Debug, Clone, Copy)]
pub struct TickInputs {
    /// Pair button level
    pub pair_button: bool,
    /// Motor driver fault line level (raw, active-low)
    pub fault: bool,
    /// Accessory-present detector level
    pub accessory_present: bool,
    /// Accessory button level (ignored while the accessory is absent)
    pub accessory_button: bool,
    /// Accessory dial ADC reading (ignored while the accessory is absent)
    pub accessory_dial: u16,
}

/// Outputs to apply to hardware after a tick
#[derive(Debug, Clone, Copy)]
pub struct TickOutputs {
    /// Indicator light level
    pub indicator: bool,
    /// New motor drive levels, if a sequencer transition or pulse fired
    pub drive: Option<PwmLevels>,
    /// The motor fault line was asserted this tick
    pub fault_raised: bool,
    /// Duration submitted to the motor this tick, if any
    pub pulse_submitted: Option<Ms>,
}

/// The bracelet's control core: all components plus the decision rule
pub struct Controller {
    policy: PulsePolicy,

    indicator: Indicator,
    pair_button: DigitalSignal,
    motor: Motor,
    accessory_detect: DigitalSignal,
    accessory_button: DigitalSignal,
    accessory_dial: AnalogSignal<DIAL_AVERAGING_WINDOW>,

    was_connected: bool,
}

impl Controller {
    /// Create the controller; the indicator starts blinking (disconnected)
    pub fn new(motor_parameters: MotorParameters, policy: PulsePolicy) -> Self {
        let mut indicator = Indicator::new();
        indicator.set_pulse(policy.blink_half_period_ms);

        Self {
            policy,
            indicator,
            pair_button: DigitalSignal::new(Polarity::ActiveHigh),
            motor: Motor::new(motor_parameters),
            accessory_detect: DigitalSignal::new(Polarity::ActiveHigh),
            accessory_button: DigitalSignal::new(Polarity::ActiveHigh),
            accessory_dial: AnalogSignal::new(),
            was_connected: false,
        }
    }

    /// One scheduler tick
    ///
    /// Update order is fixed: indicator mode, indicator, pair button,
    /// motor, accessory detector, accessory inputs (while present), then
    /// exactly one pulse decision.
    pub fn tick(&mut self, inputs: &TickInputs, link: &LinkState, now_ms: Ms) -> TickOutputs {
        // Indicator tracks connection state: solid while connected,
        // blinking while not
        let connected = link.connected();
        if connected != self.was_connected {
            if connected {
                self.indicator.set(true, now_ms);
            } else {
                self.indicator.set_pulse(self.policy.blink_half_period_ms);
            }
            self.was_connected = connected;
        }
        self.indicator.update(now_ms);

        self.pair_button.update(inputs.pair_button, now_ms);

        let motor_update = self.motor.update(inputs.fault, now_ms);
        let mut drive = motor_update.drive;

        self.accessory_detect.update(inputs.accessory_present, now_ms);
        let accessory = self.accessory_detect.level();
        if accessory {
            if self.accessory_detect.take_went_true() {
                // Fresh attach: stale envelope and button history must
                // not fire; whatever happened while unplugged is gone
                self.accessory_dial.prime(inputs.accessory_dial);
                self.accessory_button.resync(inputs.accessory_button, now_ms);
            } else {
                self.accessory_dial.update(inputs.accessory_dial);
                self.accessory_button.update(inputs.accessory_button, now_ms);
            }
        }

        let ms = self.decide(accessory, link, now_ms);

        let mut pulse_submitted = None;
        if ms != 0 {
            if let Some(levels) = self.motor.pulse(ms, now_ms) {
                drive = Some(levels);
                pulse_submitted = Some(ms);
            }
        }

        TickOutputs {
            indicator: self.indicator.level(),
            drive,
            fault_raised: motor_update.fault_raised,
            pulse_submitted,
        }
    }

    /// Evaluate the pulse-decision rules in fixed priority order
    ///
    /// Stops at the first rule yielding a non-zero duration, so lower
    /// priority events stay pending (commands keep their slots, latched
    /// edges stay latched) until a later tick.
    fn decide(&mut self, accessory: bool, link: &LinkState, now_ms: Ms) -> Ms {
        let p = self.policy;

        if accessory {
            if self.accessory_button.take_went_true() {
                return p.press_ms;
            }
            if self.accessory_button.take_went_false() {
                return p.release_ms;
            }
            if self.accessory_dial.active(p.dial_threshold_percent, now_ms) {
                return p.dial_ms;
            }
            if self.accessory_dial.active2(p.dial_double_window_ms, now_ms) {
                return p.dial_ms;
            }
        }

        let command = link.take_command1();
        if command != 0 {
            return command;
        }
        link.take_command2()
    }

    /// Request a pulse directly, bypassing the decision chain
    ///
    /// Used by calibration code driving the motor between ticks. Subject
    /// to the same asleep-only and damping rules as any other pulse.
    pub fn pulse(&mut self, ms: Ms, now_ms: Ms) -> Option<PwmLevels> {
        self.motor.pulse(ms, now_ms)
    }

    /// Swap motor tuning parameters at runtime
    pub fn set_motor_parameters(&mut self, parameters: MotorParameters) {
        self.motor.set_parameters(parameters);
    }

    /// Current motor sequence state
    pub fn motor_state(&self) -> MotorState {
        self.motor.state()
    }

    /// Pair button "has ever been pressed" witness
    pub fn pair_trap(&self) -> bool {
        self.pair_button.trap()
    }

    /// Consume a latched long-press duration of the pair button
    pub fn take_pair_held_ms(&mut self) -> Ms {
        self.pair_button.take_held_ms()
    }
}
