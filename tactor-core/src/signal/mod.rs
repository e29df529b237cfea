//! Input signal monitors
//!
//! Every button-like input goes through [`digital::DigitalSignal`]; the
//! detachable dial goes through [`analog::AnalogSignal`]. Both are updated
//! once per tick from the raw hardware level and expose single-consumer
//! events to whoever polls them.

pub mod analog;
pub mod digital;

pub use analog::AnalogSignal;
pub use digital::{DigitalSignal, Polarity};
