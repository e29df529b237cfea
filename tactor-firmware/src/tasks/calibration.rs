//! Bench calibration sweeps
//!
//! Field-tuning routines for the motor timing parameters. Each sweep
//! waits for the pair button as an arm switch, then drives the motor
//! through the parameter-swap and pulse-request slots while the operator
//! listens/feels for the best-behaved settings. Enabled with the
//! `calibration` feature, which replaces the wireless link task.

use defmt::*;
use embassy_time::{Duration, Timer};
use portable_atomic::Ordering;

use tactor_core::motor::MotorParameters;

use crate::channels::{MOTOR_ASLEEP, MOTOR_PARAMS, PAIR_TRAP, PULSE_REQUEST};

/// Pulses fired per tested setting
const PULSES_PER_SETTING: u32 = 5;

/// Block until the operator presses the pair button once
async fn wait_armed() {
    info!("Press the pair button to start");
    while !PAIR_TRAP.load(Ordering::Relaxed) {
        Timer::after(Duration::from_millis(10)).await;
    }
}

/// Fire one pulse and wait for the sequencer to return to sleep
async fn pulse_and_wait(ms: u32) {
    PULSE_REQUEST.signal(ms);
    // Give the tick task a chance to pick the request up
    Timer::after(Duration::from_millis(2)).await;
    while !MOTOR_ASLEEP.load(Ordering::Relaxed) {
        Timer::after(Duration::from_millis(1)).await;
    }
}

/// Sweep `brake_ms_max` downward to find the shortest effective brake
pub async fn calibrate_brake_ms_max() {
    info!("Calibration: brake_ms_max sweep");
    let mut parameters = MotorParameters {
        pwm: 254,
        reverse_denominator: 1,
        reverse_ms_max: 0,
        brake_denominator: 1,
        brake_ms_max: 150,
    };
    MOTOR_PARAMS.signal(parameters);

    wait_armed().await;

    while parameters.brake_ms_max > 10 {
        Timer::after(Duration::from_secs(1)).await;
        parameters.brake_ms_max -= 10;
        MOTOR_PARAMS.signal(parameters);
        info!("brake_ms_max = {}", parameters.brake_ms_max);

        for _ in 0..PULSES_PER_SETTING {
            pulse_and_wait(1000).await;
        }
    }
}

/// Sweep `reverse_ms_max` downward to find the shortest effective kick
pub async fn calibrate_reverse_ms_max() {
    info!("Calibration: reverse_ms_max sweep");
    let mut parameters = MotorParameters {
        pwm: 254,
        reverse_denominator: 1,
        reverse_ms_max: 20,
        brake_denominator: 1,
        brake_ms_max: 150,
    };
    MOTOR_PARAMS.signal(parameters);

    wait_armed().await;

    while parameters.reverse_ms_max > 2 {
        Timer::after(Duration::from_secs(1)).await;
        parameters.reverse_ms_max -= 2;
        MOTOR_PARAMS.signal(parameters);
        info!("reverse_ms_max = {}", parameters.reverse_ms_max);

        for _ in 0..PULSES_PER_SETTING {
            pulse_and_wait(1000).await;
        }
    }
}

/// Grid sweep over both denominators across a range of pulse lengths
pub async fn calibrate_denominators() {
    info!("Calibration: denominator grid sweep");
    let mut parameters = MotorParameters::default();

    wait_armed().await;

    info!("brake_den\treverse_den\tms");
    for brake_den in (3..=6u32).rev() {
        for reverse_den in (4..=7u32).rev() {
            parameters.brake_denominator = brake_den;
            parameters.reverse_denominator = reverse_den;
            MOTOR_PARAMS.signal(parameters);

            for duration in (20..=100u32).rev().step_by(10) {
                info!("{}\t{}\t{}", brake_den, reverse_den, duration);
                for _ in 0..PULSES_PER_SETTING {
                    pulse_and_wait(duration).await;
                }
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Calibration task - runs the denominator sweep (edit to pick another)
#[embassy_executor::task]
pub async fn calibration_task() {
    info!("Calibration task started");
    calibrate_denominators().await;
    info!("Calibration sweep complete");
}
