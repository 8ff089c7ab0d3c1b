//! Integration test: a timeout bounding a setpoint move.
//!
//! The actuators never settle on their own; a shared flag decides when they
//! report in tolerance. The wrapper must finish with its child when the flag
//! flips inside the budget and exactly at the budget otherwise, in both cases
//! as a normal finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gridlock_common::resource::Resource;
use gridlock_common::superstructure::{Setpoint, SuperstructureConfig};
use gridlock_control::action::{ActionExt, ActionState};
use gridlock_control::actions::SetSetpoint;
use gridlock_control::config::ControlConfig;
use gridlock_control::cycle::CycleRunner;
use gridlock_control::robot::Robot;
use gridlock_control::scheduler::{ActionId, Scheduler, SchedulerEvent};
use gridlock_control::sim::{SimDrive, SimIndicator, SimRoller, SimVision};
use gridlock_control::superstructure::{ActuatorDriver, DriverError, Superstructure};

use super::{finished_at, step};

/// Actuator whose settle state is controlled from the test.
struct Gated {
    name: &'static str,
    target: Option<f64>,
    settled: Arc<AtomicBool>,
}

impl ActuatorDriver for Gated {
    fn name(&self) -> &str {
        self.name
    }

    fn set_target(&mut self, target: f64) {
        self.target = Some(target);
    }

    fn target(&self) -> Option<f64> {
        self.target
    }

    fn current_position(&self) -> f64 {
        0.0
    }

    fn is_within_tolerance(&self, _target: f64) -> bool {
        self.settled.load(Ordering::SeqCst)
    }

    fn zero(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

fn gated_runner(settled: &Arc<AtomicBool>) -> (CycleRunner, ActionId) {
    let gate = |name: &'static str| {
        Box::new(Gated {
            name,
            target: None,
            settled: settled.clone(),
        })
    };
    let superstructure = Superstructure::new(
        SuperstructureConfig::default(),
        gate("lift"),
        gate("wrist"),
        Box::new(SimRoller::new("gripper")),
    );
    let mut robot = Robot::new(
        superstructure,
        Box::new(SimDrive::new()),
        Box::new(SimVision::new(Duration::ZERO, None)),
        Box::new(SimIndicator::new()),
    );
    robot.set_enabled(true);

    let mut scheduler = Scheduler::new();
    scheduler.register_all(Resource::standard()).unwrap();
    let id = scheduler
        .schedule(
            SetSetpoint::until_reached(Setpoint::ScoreMidCone)
                .with_timeout(Duration::from_secs(2))
                .unwrap()
                .boxed(),
        )
        .unwrap();
    (
        CycleRunner::new(scheduler, robot, &ControlConfig::default().cycle),
        id,
    )
}

#[test]
fn finishes_early_when_setpoint_reached() {
    let settled = Arc::new(AtomicBool::new(false));
    let (mut runner, id) = gated_runner(&settled);

    // Cycles 1..=74 cover t = 0.02 .. 1.48 s.
    let events = step(&mut runner, 74);
    assert_eq!(finished_at(&events, id), None);

    settled.store(true, Ordering::SeqCst);
    let events = step(&mut runner, 1);
    assert_eq!(finished_at(&events, id), Some(75));
    assert_eq!(runner.now(), Duration::from_millis(1500));
    assert_eq!(runner.scheduler().state(id), Some(ActionState::Finished));
}

#[test]
fn finishes_at_budget_when_never_reached() {
    let settled = Arc::new(AtomicBool::new(false));
    let (mut runner, id) = gated_runner(&settled);

    let events = step(&mut runner, 150);
    // Started at cycle 1 (t = 0.02 s); two seconds later is cycle 101.
    assert_eq!(finished_at(&events, id), Some(101));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SchedulerEvent::Interrupted { id: i, .. } if *i == id))
    );
    assert_eq!(runner.scheduler().state(id), Some(ActionState::Finished));
    // The request outlives the timed-out move.
    assert_eq!(
        runner.robot().superstructure.desired_setpoint(),
        Setpoint::ScoreMidCone
    );
}
