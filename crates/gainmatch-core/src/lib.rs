//! Gain matching for SABRE ring/wedge channels.
//!
//! Measured ring-vs-wedge slopes are fit with a ratio model
//! (`slope = ring_factor / wedge_factor`, ring 0 pinned to 1.0), then scaled by
//! a per-board global factor and written out per physical channel.

pub mod common;
pub mod domain;
pub mod modules;

pub use domain::{
    CalibrationRequest, ChannelCalibration, ChannelInfo, DetectorType, ErrorCategory,
    GainMatchError, GainMatchResult,
};
pub use modules::ChannelMapper;
pub use modules::pipeline::{CalibrationOutcome, run_calibration};
