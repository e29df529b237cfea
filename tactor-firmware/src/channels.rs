//! Inter-task communication
//!
//! The tick task runs the control core; everything another context wants
//! to push at it crosses through the statics here. Each field is
//! independently meaningful (a consumed signal or a zeroed slot always
//! means "nothing pending"), so no multi-field locking is needed.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use tactor_core::link::LinkState;
use tactor_core::motor::MotorParameters;

/// Shared wireless-command surface (connection flag + command slots)
pub static LINK: LinkState = LinkState::new();

/// Motor tuning parameter swap slot (calibration -> tick task)
pub static MOTOR_PARAMS: Signal<CriticalSectionRawMutex, MotorParameters> = Signal::new();

/// Direct pulse request in ms (calibration -> tick task)
pub static PULSE_REQUEST: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Published each tick: motor sequencer is asleep
pub static MOTOR_ASLEEP: AtomicBool = AtomicBool::new(true);

/// Published each tick: pair button has been pressed at least once
pub static PAIR_TRAP: AtomicBool = AtomicBool::new(false);
