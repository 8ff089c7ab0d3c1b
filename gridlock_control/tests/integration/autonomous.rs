//! Integration test: autonomous routines on the simulated robot.
//!
//! Validates: every selectable routine assembles and runs to completion in
//! simulated time, SubstationThree ends braked with the cube pipeline active
//! and the intake deployed, red options start from mirrored poses unless a
//! red group of their own is loaded, and a short path fails at assembly
//! without touching the scheduler.

use gridlock_common::superstructure::Setpoint;
use gridlock_control::action::ActionState;
use gridlock_control::auto::{AutoSelector, PathGroup, RoutineError};
use gridlock_control::config::ControlConfig;
use gridlock_control::robot::{FIELD_LENGTH_M, NeutralMode, Pipeline};
use gridlock_control::scheduler::ActionId;
use gridlock_control::sim::{TimedPathFollowerFactory, demo_paths};

use super::{bound_runner, finished_at, step};

/// 30 s of simulated time at 20 ms.
const MAX_CYCLES: u32 = 1500;

fn schedule(
    runner: &mut gridlock_control::cycle::CycleRunner,
    option: &str,
    paths: &[PathGroup],
) -> Result<ActionId, RoutineError> {
    let mut selector = AutoSelector::standard();
    selector.select(option)?;
    let routine = selector.build(paths, &TimedPathFollowerFactory, &ControlConfig::default().auto)?;
    Ok(runner.scheduler_mut().schedule(routine).unwrap())
}

#[test]
fn every_option_runs_to_completion() {
    let options: Vec<String> = AutoSelector::standard()
        .options()
        .map(str::to_string)
        .collect();
    for option in options {
        let (mut runner, _) = bound_runner(&ControlConfig::default());
        let id = schedule(&mut runner, &option, &demo_paths()).unwrap();
        let events = step(&mut runner, MAX_CYCLES);
        assert!(
            finished_at(&events, id).is_some(),
            "{option} did not finish in {MAX_CYCLES} cycles"
        );
        assert_eq!(runner.scheduler().state(id), Some(ActionState::Finished));
    }
}

#[test]
fn substation_three_end_state() {
    let (mut runner, bindings) = bound_runner(&ControlConfig::default());
    let id = schedule(&mut runner, "SubstationThree", &demo_paths()).unwrap();

    let events = step(&mut runner, MAX_CYCLES);
    let done = finished_at(&events, id).unwrap();
    // Three 3 s segments plus scoring: well past ten seconds.
    assert!(done > 500, "finished too early at cycle {done}");

    let robot = runner.robot();
    assert_eq!(robot.drivetrain.neutral_mode(), NeutralMode::Brake);
    assert_eq!(robot.vision.pipeline(), Pipeline::Cube);
    assert_eq!(
        robot.superstructure.desired_setpoint(),
        Setpoint::IntakingLowCube
    );
    assert_eq!(robot.field.trajectory_name(), Some("SubstationThree"));
    // Teleop driving resumes once the routine lets go.
    assert!(runner.scheduler().is_running(bindings.drive));
}

#[test]
fn red_option_starts_mirrored() {
    let (mut runner, _) = bound_runner(&ControlConfig::default());
    schedule(&mut runner, "RedDriveForward", &demo_paths()).unwrap();
    // Odometry reset, then the plot.
    step(&mut runner, 2);

    let blue_start = demo_paths()[0].initial_pose().unwrap();
    let pose = runner.robot().drivetrain.pose();
    assert!((pose.x - (FIELD_LENGTH_M - blue_start.x)).abs() < 1e-9);
    assert!((pose.y - blue_start.y).abs() < 1e-9);
    assert_eq!(runner.robot().field.trajectory_name(), Some("RedDriveForward"));
    assert_eq!(runner.robot().field.poses()[0], pose);
}

#[test]
fn dedicated_red_group_is_driven_as_loaded() {
    let mut paths = demo_paths();
    let red_segments = paths[0].mirrored().segments().to_vec();
    let red_start = red_segments[0].initial_pose();
    paths.push(PathGroup::new("RedDriveForward", red_segments));

    let (mut runner, _) = bound_runner(&ControlConfig::default());
    schedule(&mut runner, "RedDriveForward", &paths).unwrap();
    step(&mut runner, 2);

    let pose = runner.robot().drivetrain.pose();
    assert!(
        (pose.x - red_start.x).abs() < 1e-9,
        "expected red start x={} got x={}",
        red_start.x,
        pose.x
    );
    assert!(pose.x > FIELD_LENGTH_M / 2.0);
    assert_eq!(runner.robot().field.poses()[0], red_start);
}

#[test]
fn short_path_fails_before_scheduling() {
    let (mut runner, _) = bound_runner(&ControlConfig::default());
    let paths: Vec<PathGroup> = demo_paths()
        .into_iter()
        .map(|group| {
            if group.name() == "SubstationThree" {
                PathGroup::new(group.name(), group.segments()[..1].to_vec())
            } else {
                group
            }
        })
        .collect();

    let err = schedule(&mut runner, "SubstationThree", &paths).unwrap_err();
    assert_eq!(
        err,
        RoutineError::MissingPathSegment {
            path: "SubstationThree".to_string(),
            index: 2,
            available: 1,
        }
    );
    assert!(runner.scheduler().running().is_empty());
}
