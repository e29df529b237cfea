//! Periodic control tick
//!
//! Runs the control core once per millisecond: samples every input,
//! advances the controller, applies the outputs to PWM and GPIO, and
//! publishes the cross-context observables. This task is the only owner
//! of the controller; other contexts reach it through the slots in
//! `channels`.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::{Input, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use tactor_core::controller::{Controller, PulsePolicy, TickInputs};
use tactor_core::motor::{MotorParameters, MotorState};

use crate::channels::{LINK, MOTOR_ASLEEP, MOTOR_PARAMS, PAIR_TRAP, PULSE_REQUEST};

/// Tick interval in milliseconds
///
/// Human button presses span many of these; it is also the debounce
/// interval of every digital input.
pub const TICK_INTERVAL_MS: u64 = 1;

/// PWM wrap value; drive levels are 0-255 duty counts
const PWM_TOP: u16 = 255;

/// Tick task - drives the control core at a fixed period
#[embassy_executor::task]
#[allow(clippy::too_many_arguments)]
pub async fn tick_task(
    mut pwm: Pwm<'static>,
    mut led: Output<'static>,
    pair: Input<'static>,
    fault: Input<'static>,
    aux_detect: Input<'static>,
    aux_button: Input<'static>,
    mut adc: Adc<'static, Async>,
    mut dial_channel: Channel<'static>,
) {
    info!("Tick task started");

    let mut controller = Controller::new(MotorParameters::default(), PulsePolicy::default());

    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;
    pwm_config.compare_a = 0;
    pwm_config.compare_b = 0;
    pwm.set_config(&pwm_config);

    let start = Instant::now();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis() as u32;

        // Parameter swaps and direct pulses from the calibration context
        if let Some(params) = MOTOR_PARAMS.try_take() {
            debug!("Motor parameters swapped: {:?}", params);
            controller.set_motor_parameters(params);
        }
        if let Some(ms) = PULSE_REQUEST.try_take() {
            if controller.pulse(ms, now_ms).is_some() {
                debug!("Direct pulse: {}ms", ms);
            }
        }

        let accessory_present = aux_detect.is_high();

        // A failing ADC read is indistinguishable from a real zero reading;
        // accepted limitation of the sensor path
        let accessory_dial = if accessory_present {
            adc.read(&mut dial_channel).await.unwrap_or(0)
        } else {
            0
        };

        let inputs = TickInputs {
            pair_button: pair.is_high(),
            fault: fault.is_high(),
            accessory_present,
            accessory_button: aux_button.is_high(),
            accessory_dial,
        };

        let out = controller.tick(&inputs, &LINK, now_ms);

        if out.fault_raised {
            warn!("Motor driver fault detected; outputs latched off");
        }
        if let Some(ms) = out.pulse_submitted {
            trace!("Pulse submitted: {}ms", ms);
        }
        let held = controller.take_pair_held_ms();
        if held != 0 {
            info!("Pair button held for {}ms", held);
        }

        if let Some(levels) = out.drive {
            pwm_config.compare_a = levels.a as u16;
            pwm_config.compare_b = levels.b as u16;
            pwm.set_config(&pwm_config);
        }

        if out.indicator {
            led.set_high();
        } else {
            led.set_low();
        }

        MOTOR_ASLEEP.store(controller.motor_state() == MotorState::Asleep, Ordering::Relaxed);
        PAIR_TRAP.store(controller.pair_trap(), Ordering::Relaxed);
    }
}
