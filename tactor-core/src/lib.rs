//! Board-agnostic control core for the Tactor haptic bracelet
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Debounced digital signal monitor (edge + latch semantics)
//! - Averaged analog signal monitor (envelope activation events)
//! - Indicator light pulser
//! - Motor pulse state machine with fault interlock
//! - Per-tick orchestrator with the pulse-decision priority chain
//! - Wireless command link surface (atomic slots + line parser)
//!
//! Nothing here blocks, sleeps, or allocates. Every time-dependent
//! operation takes a millisecond timestamp supplied by the caller, so
//! the whole crate is testable on the host.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod controller;
pub mod indicator;
pub mod link;
pub mod motor;
pub mod signal;

/// Millisecond timestamp since boot
///
/// Wraps after ~49.7 days; all deadline comparisons use wrapping
/// arithmetic so a wrap mid-cycle does not corrupt timing.
pub type Ms = u32;
