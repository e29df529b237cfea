//! Board pin assignments for the reference bracelet PCB
//!
//! GPIO numbers only; ownership of the typed pin singletons stays in
//! `main`. The motor legs share one PWM slice (GPIO20 = channel A,
//! GPIO21 = channel B) so both compare levels load atomically.

/// Indicator LED
pub const PIN_LED: u8 = 19;
/// Pairing / arm button
pub const PIN_PAIR: u8 = 18;

/// Motor H-bridge leg 1 (PWM slice 2, channel B)
pub const PIN_MOTOR_A1: u8 = 21;
/// Motor H-bridge leg 2 (PWM slice 2, channel A)
pub const PIN_MOTOR_A2: u8 = 20;
/// Motor driver fault line, active-low, pulled up
pub const PIN_MOTOR_FAULT: u8 = 22;

/// Accessory-present detector
pub const PIN_AUX_DETECT: u8 = 14;
/// Accessory button
pub const PIN_AUX_DIGITAL: u8 = 15;
/// Accessory dial wiper (ADC0)
pub const PIN_AUX_ANALOG: u8 = 26;
