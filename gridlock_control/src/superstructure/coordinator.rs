//! Superstructure coordinator.
//!
//! Holds the desired setpoint and gripper state written by whichever action
//! owns the lift/wrist or gripper resources, and turns them into driver
//! commands once per tick in `apply()`.
//!
//! # Wrist-first settle
//!
//! While the lift is farther than `lift_travel_threshold` from its target,
//! the wrist is parked at `wrist_travel_angle` and the lift holds position
//! until the wrist is parked. Once the lift is inside the threshold the wrist
//! is released to its final target.
//!
//! ```text
//!  park wrist ──▶ travel lift ──▶ release wrist ──▶ at setpoint
//! ```

use std::time::Duration;

use gridlock_common::superstructure::{
    GripperState, Setpoint, SetpointTargets, SuperstructureConfig, Zone,
};
use tracing::{debug, info};

use super::driver::{ActuatorDriver, DriverError, RollerDriver};
use super::zone::classify;

pub struct Superstructure {
    config: SuperstructureConfig,
    lift: Box<dyn ActuatorDriver>,
    wrist: Box<dyn ActuatorDriver>,
    gripper: Box<dyn RollerDriver>,
    desired: Setpoint,
    gripper_state: GripperState,
    /// Raw roller output, overriding the state table while set.
    gripper_override: Option<f64>,
    zone: Zone,
}

impl Superstructure {
    pub fn new(
        config: SuperstructureConfig,
        lift: Box<dyn ActuatorDriver>,
        wrist: Box<dyn ActuatorDriver>,
        gripper: Box<dyn RollerDriver>,
    ) -> Self {
        Self {
            config,
            lift,
            wrist,
            gripper,
            desired: Setpoint::Stowed,
            gripper_state: GripperState::None,
            gripper_override: None,
            zone: Zone::Disabled,
        }
    }

    #[inline]
    pub fn config(&self) -> &SuperstructureConfig {
        &self.config
    }

    // ── Setpoint ──

    /// Record the desired setpoint. Takes effect on the next `apply()`.
    pub fn request_setpoint(&mut self, setpoint: Setpoint) {
        if setpoint != self.desired {
            debug!(from = ?self.desired, to = ?setpoint, "setpoint requested");
            self.desired = setpoint;
        }
    }

    #[inline]
    pub fn desired_setpoint(&self) -> Setpoint {
        self.desired
    }

    /// Resolved targets of the desired setpoint.
    pub fn targets(&self) -> SetpointTargets {
        self.config.targets(self.desired)
    }

    /// True when both lift and wrist are inside tolerance of the final
    /// targets of the desired setpoint.
    pub fn is_at_setpoint(&self) -> bool {
        let targets = self.targets();
        self.lift.is_within_tolerance(targets.lift) && self.wrist.is_within_tolerance(targets.wrist)
    }

    pub fn lift_position(&self) -> f64 {
        self.lift.current_position()
    }

    pub fn wrist_position(&self) -> f64 {
        self.wrist.current_position()
    }

    // ── Gripper ──

    pub fn set_gripper_state(&mut self, state: GripperState) {
        if state != self.gripper_state {
            debug!(from = ?self.gripper_state, to = ?state, "gripper state");
            self.gripper_state = state;
        }
    }

    #[inline]
    pub fn gripper_state(&self) -> GripperState {
        self.gripper_state
    }

    /// Drive the rollers at a raw output, or `None` to return to the state
    /// table.
    pub fn set_gripper_output(&mut self, output: Option<f64>) {
        self.gripper_override = output.map(|o| o.clamp(-1.0, 1.0));
    }

    /// Output the rollers will be driven at.
    pub fn gripper_output(&self) -> f64 {
        self.gripper_override
            .unwrap_or_else(|| self.config.gripper_output(self.gripper_state))
    }

    /// Output last written to the roller driver.
    pub fn applied_gripper_output(&self) -> f64 {
        self.gripper.output()
    }

    // ── Zone ──

    /// Reclassify the current position. Called once per tick.
    pub fn update_zone(&mut self, enabled: bool) -> Zone {
        let zone = classify(
            &self.config.zones,
            self.lift.current_position(),
            self.wrist.current_position(),
            enabled,
        );
        if zone != self.zone {
            debug!(from = ?self.zone, to = ?zone, "zone changed");
            self.zone = zone;
        }
        zone
    }

    #[inline]
    pub fn current_zone(&self) -> Zone {
        self.zone
    }

    // ── Actuation ──

    /// Push targets and outputs to the drivers, then service them.
    pub fn apply(&mut self, dt: Duration) {
        let targets = self.targets();
        let lift_error = (targets.lift - self.lift.current_position()).abs();

        match self.config.wrist_travel_angle {
            Some(travel) if lift_error > self.config.lift_travel_threshold => {
                self.wrist.set_target(travel);
                if self.wrist.is_within_tolerance(travel) {
                    self.lift.set_target(targets.lift);
                } else if self.lift.target().is_none_or(|t| t != targets.lift) {
                    let hold = self.lift.current_position();
                    self.lift.set_target(hold);
                }
            }
            _ => {
                self.lift.set_target(targets.lift);
                self.wrist.set_target(targets.wrist);
            }
        }

        self.gripper.set_output(self.gripper_output());
        self.lift.periodic(dt);
        self.wrist.periodic(dt);
    }

    /// Zero both position actuators.
    pub fn zero_all(&mut self) -> Result<(), DriverError> {
        self.lift.zero()?;
        self.wrist.zero()?;
        info!(lift = self.lift.name(), wrist = self.wrist.name(), "superstructure zeroed");
        Ok(())
    }
}
