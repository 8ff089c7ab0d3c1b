//! Driver traits for the superstructure actuators.
//!
//! The coordinator talks to hardware (or simulation) only through these
//! traits. Drivers are owned by the coordinator and serviced once per tick via
//! `periodic()`; none of the calls may block.

use std::time::Duration;
use thiserror::Error;

/// Error types for actuator driver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Position reference could not be established.
    #[error("{actuator}: zeroing failed: {reason}")]
    ZeroingFailed { actuator: String, reason: String },

    /// Hardware communication error.
    #[error("{actuator}: communication error: {reason}")]
    Communication { actuator: String, reason: String },
}

/// Closed-loop position actuator (lift, wrist).
///
/// | Operation | Called | Blocking |
/// |-----------|--------|----------|
/// | `set_target()` | every tick by the coordinator | never |
/// | `periodic()` | every tick, after targets | never |
/// | `zero()` | startup / operator request | never |
pub trait ActuatorDriver {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Command a new closed-loop target.
    fn set_target(&mut self, target: f64);

    /// Last commanded target, if any.
    fn target(&self) -> Option<f64>;

    /// Measured position.
    fn current_position(&self) -> f64;

    /// True when the measured position is inside the driver's tolerance band
    /// around `target`.
    fn is_within_tolerance(&self, target: f64) -> bool;

    /// Re-establish the position reference at the current mechanical stop.
    fn zero(&mut self) -> Result<(), DriverError>;

    /// Service the driver for one control period.
    fn periodic(&mut self, _dt: Duration) {}
}

/// Open-loop roller output (gripper).
pub trait RollerDriver {
    fn name(&self) -> &str;

    /// Percent output in [-1.0, 1.0].
    fn set_output(&mut self, output: f64);

    fn output(&self) -> f64;
}
