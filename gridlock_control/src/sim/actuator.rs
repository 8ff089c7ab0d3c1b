//! Simulated position actuator and roller.

use std::time::Duration;

use crate::superstructure::{ActuatorDriver, DriverError, RollerDriver};

/// Position actuator that slews toward its target at a fixed rate.
///
/// An infinite rate snaps to the target on the next `periodic()`.
#[derive(Debug, Clone)]
pub struct SimActuator {
    name: String,
    position: f64,
    target: Option<f64>,
    max_velocity: f64,
    tolerance: f64,
}

impl SimActuator {
    pub fn new(name: impl Into<String>, tolerance: f64) -> Self {
        Self {
            name: name.into(),
            position: 0.0,
            target: None,
            max_velocity: f64::INFINITY,
            tolerance,
        }
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }
}

impl ActuatorDriver for SimActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_target(&mut self, target: f64) {
        self.target = Some(target);
    }

    fn target(&self) -> Option<f64> {
        self.target
    }

    fn current_position(&self) -> f64 {
        self.position
    }

    fn is_within_tolerance(&self, target: f64) -> bool {
        (self.position - target).abs() <= self.tolerance
    }

    fn zero(&mut self) -> Result<(), DriverError> {
        self.position = 0.0;
        self.target = None;
        Ok(())
    }

    fn periodic(&mut self, dt: Duration) {
        let Some(target) = self.target else {
            return;
        };
        if self.max_velocity.is_infinite() {
            self.position = target;
            return;
        }
        let max_step = self.max_velocity * dt.as_secs_f64();
        self.position += (target - self.position).clamp(-max_step, max_step);
    }
}

/// Roller that just records its output.
#[derive(Debug, Clone)]
pub struct SimRoller {
    name: String,
    output: f64,
}

impl SimRoller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: 0.0,
        }
    }
}

impl RollerDriver for SimRoller {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_output(&mut self, output: f64) {
        self.output = output;
    }

    fn output(&self) -> f64 {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(100);

    #[test]
    fn slews_at_max_velocity() {
        let mut lift = SimActuator::new("lift", 0.01).with_max_velocity(1.0);
        lift.set_target(0.25);
        lift.periodic(DT);
        assert!((lift.current_position() - 0.1).abs() < 1e-12);
        lift.periodic(DT);
        lift.periodic(DT);
        assert!((lift.current_position() - 0.25).abs() < 1e-12);
        assert!(lift.is_within_tolerance(0.25));
    }

    #[test]
    fn infinite_velocity_snaps() {
        let mut wrist = SimActuator::new("wrist", 1.0);
        wrist.set_target(90.0);
        assert!(!wrist.is_within_tolerance(90.0));
        wrist.periodic(DT);
        assert_eq!(wrist.current_position(), 90.0);
    }

    #[test]
    fn no_target_holds_position() {
        let mut lift = SimActuator::new("lift", 0.01).with_position(0.4);
        lift.periodic(DT);
        assert_eq!(lift.current_position(), 0.4);
        assert_eq!(lift.target(), None);
    }

    #[test]
    fn zero_resets_reference() {
        let mut lift = SimActuator::new("lift", 0.01).with_position(0.4);
        lift.set_target(0.8);
        lift.zero().unwrap();
        assert_eq!(lift.current_position(), 0.0);
        assert_eq!(lift.target(), None);
    }
}
