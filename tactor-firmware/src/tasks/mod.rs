//! Embassy task modules

pub mod calibration;
pub mod link;
pub mod tick;
