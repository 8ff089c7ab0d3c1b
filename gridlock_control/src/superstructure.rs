//! Superstructure coordination: lift, wrist and gripper.
//!
//! - [`driver`] - Actuator and roller driver traits, `DriverError`
//! - [`zone`] - First-match zone classification
//! - [`coordinator`] - `Superstructure`, which resolves the desired setpoint
//!   into driver targets every tick

pub mod coordinator;
pub mod driver;
pub mod zone;

pub use coordinator::Superstructure;
pub use driver::{ActuatorDriver, DriverError, RollerDriver};
pub use zone::classify;
