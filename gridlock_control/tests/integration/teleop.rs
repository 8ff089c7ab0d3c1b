//! Integration test: operator bindings through the cycle runner.
//!
//! Validates: button holds drive setpoints, newer holds preempt older ones,
//! trigger intakes, the drivetrain default yields to a routine and comes
//! back, disabling stops everything that does not run disabled, and the
//! status light keeps tracking the zone across enable changes.

use std::time::Duration;

use gridlock_common::superstructure::{GripperState, Setpoint, Zone};
use gridlock_control::action::{ActionContext, ActionExt, Wait};
use gridlock_control::actions::StopDrivetrain;
use gridlock_control::bindings::{Axis, Buttons, MANUAL_INTAKE_OUTPUT};
use gridlock_control::combinator::Sequence;
use gridlock_control::config::ControlConfig;
use gridlock_control::scheduler::{InterruptCause, SchedulerEvent};

use super::{bound_runner, step};

#[test]
fn drivetrain_default_starts_on_first_tick() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    let events = step(&mut runner, 1);
    assert!(events.contains(&SchedulerEvent::Started {
        cycle: 1,
        id: bindings.drive,
        is_default: true,
    }));
    assert!(runner.scheduler().is_running(bindings.drive));
}

#[test]
fn held_button_moves_superstructure_and_release_cancels() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    let (_, mid) = bindings.setpoints[1];

    runner.robot_mut().input.set_pressed(Buttons::B, true);
    step(&mut runner, 1);
    assert!(runner.scheduler().is_running(mid));
    assert_eq!(
        runner.robot().superstructure.desired_setpoint(),
        Setpoint::ScoreMidCone
    );

    let reached = runner
        .run_until(200, |_, robot| robot.superstructure.is_at_setpoint())
        .unwrap();
    assert!(reached.is_some());

    runner.robot_mut().input.set_pressed(Buttons::B, false);
    let events = step(&mut runner, 1);
    assert!(!runner.scheduler().is_running(mid));
    assert!(events.iter().any(|e| matches!(
        e,
        SchedulerEvent::Interrupted {
            cause: InterruptCause::Cancelled,
            ..
        }
    )));
    // The last request stays in effect.
    assert_eq!(
        runner.robot().superstructure.desired_setpoint(),
        Setpoint::ScoreMidCone
    );
}

#[test]
fn newer_setpoint_button_preempts() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    let (_, low) = bindings.setpoints[0];
    let (_, high) = bindings.setpoints[3];

    runner.robot_mut().input.set_pressed(Buttons::A, true);
    step(&mut runner, 2);
    runner.robot_mut().input.set_pressed(Buttons::Y, true);
    let events = step(&mut runner, 1);

    assert!(events.contains(&SchedulerEvent::Interrupted {
        cycle: 3,
        id: low,
        cause: InterruptCause::Preempted { by: high },
    }));
    assert!(runner.scheduler().is_running(high));
    assert_eq!(
        runner.robot().superstructure.desired_setpoint(),
        Setpoint::ScoreHighCone
    );
}

#[test]
fn trigger_runs_intake_while_held() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());

    runner.robot_mut().input.set_axis(Axis::LeftTrigger, 0.6);
    step(&mut runner, 1);
    assert!(runner.scheduler().is_running(bindings.intake));
    assert_eq!(
        runner.robot().superstructure.applied_gripper_output(),
        MANUAL_INTAKE_OUTPUT
    );

    runner.robot_mut().input.set_axis(Axis::LeftTrigger, 0.05);
    step(&mut runner, 1);
    assert!(!runner.scheduler().is_running(bindings.intake));
    assert_eq!(runner.robot().superstructure.gripper_state(), GripperState::None);
    assert_eq!(runner.robot().superstructure.applied_gripper_output(), 0.0);
}

#[test]
fn routine_takes_drivetrain_then_default_returns() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    step(&mut runner, 1);

    let routine = Sequence::new(vec![
        Wait::new(Duration::from_millis(100)).boxed(),
        StopDrivetrain.boxed(),
    ])
    .unwrap()
    .named("Park");
    let id = runner.scheduler_mut().schedule(routine.boxed()).unwrap();

    let events = step(&mut runner, 1);
    assert!(events.contains(&SchedulerEvent::Interrupted {
        cycle: 2,
        id: bindings.drive,
        cause: InterruptCause::Preempted { by: id },
    }));

    let done = runner
        .run_until(50, |scheduler, _| !scheduler.is_running(id))
        .unwrap();
    assert!(done.is_some());
    step(&mut runner, 1);
    assert!(runner.scheduler().is_running(bindings.drive));
}

#[test]
fn disabling_interrupts_and_zeroes_outputs() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    runner.robot_mut().input.set_axis(Axis::RightTrigger, 1.0);
    step(&mut runner, 2);
    assert!(runner.scheduler().is_running(bindings.reverse_intake));

    runner.robot_mut().set_enabled(false);
    let events = step(&mut runner, 1);
    assert!(events.contains(&SchedulerEvent::Interrupted {
        cycle: 3,
        id: bindings.reverse_intake,
        cause: InterruptCause::Disabled,
    }));
    assert!(!runner.scheduler().is_running(bindings.drive));
    assert!(!runner.robot().is_enabled());
    assert_eq!(runner.robot().superstructure.applied_gripper_output(), 0.0);
}

#[test]
fn status_light_runs_disabled_and_follows_zone() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    runner.robot_mut().set_enabled(false);
    let events = step(&mut runner, 1);
    assert!(events.contains(&SchedulerEvent::Started {
        cycle: 1,
        id: bindings.signal,
        is_default: true,
    }));
    assert!(!runner.scheduler().is_running(bindings.drive));
    assert_eq!(runner.robot().indicator.shown(), Some(Zone::Disabled));

    runner.robot_mut().set_enabled(true);
    runner.robot_mut().input.set_pressed(Buttons::Y, true);
    let extended = runner
        .run_until(500, |_, robot| robot.indicator.shown() == Some(Zone::Extended))
        .unwrap();
    assert!(extended.is_some(), "light never showed the extended zone");
    assert!(runner.scheduler().is_running(bindings.signal));

    runner.robot_mut().set_enabled(false);
    let events = step(&mut runner, 1);
    assert!(!events.iter().any(|e| matches!(
        e,
        SchedulerEvent::Interrupted { id, .. } if *id == bindings.signal
    )));
    assert!(runner.scheduler().is_running(bindings.signal));
    assert_eq!(runner.robot().indicator.shown(), Some(Zone::Disabled));
}
