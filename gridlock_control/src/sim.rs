//! Simulated collaborators.
//!
//! Stand-ins for the hardware drivers, the drivetrain, the camera, the
//! status light and the path follower, used by the binary's simulation mode
//! and by the tests. All of them advance only in `periodic(dt)`, driven by
//! the tick clock.

pub mod actuator;
pub mod drive;
pub mod indicator;
pub mod vision;

pub use actuator::{SimActuator, SimRoller};
pub use drive::{SimDrive, TimedPathFollower, TimedPathFollowerFactory};
pub use indicator::SimIndicator;
pub use vision::SimVision;

use std::f64::consts::PI;
use std::time::Duration;

use gridlock_common::superstructure::Setpoint;

use crate::auto::path::{PathGroup, PathSegment};
use crate::config::ControlConfig;
use crate::robot::{Pose2d, Robot};
use crate::superstructure::Superstructure;

/// Build a robot wired to simulated collaborators. The robot starts disabled.
pub fn build_sim_robot(config: &ControlConfig) -> Robot {
    let ss = &config.superstructure;
    let lift = SimActuator::new("lift", ss.lift_tolerance)
        .with_max_velocity(config.sim.lift_velocity)
        .with_position(ss.targets(Setpoint::Stowed).lift);
    let wrist = SimActuator::new("wrist", ss.wrist_tolerance)
        .with_max_velocity(config.sim.wrist_velocity)
        .with_position(ss.targets(Setpoint::Stowed).wrist);
    let superstructure = Superstructure::new(
        ss.clone(),
        Box::new(lift),
        Box::new(wrist),
        Box::new(SimRoller::new("gripper")),
    );
    let vision = SimVision::new(
        config.sim.vision_acquire_delay(),
        config.sim.vision_target_present.then_some(config.sim.vision_target_offset),
    );
    Robot::new(
        superstructure,
        Box::new(SimDrive::new()),
        Box::new(vision),
        Box::new(SimIndicator::new()),
    )
}

fn segment(name: &str, secs: u64, from: Pose2d, to: Pose2d) -> PathSegment {
    PathSegment::new(name, Duration::from_secs(secs), from, to)
}

/// Built-in paths for the simulator, keyed by routine path name.
///
/// Blue-alliance coordinates. `Red*` options without a group of their own
/// drive these mirrored.
pub fn demo_paths() -> Vec<PathGroup> {
    let grid = Pose2d::new(1.85, 4.45, PI);
    let piece_one = Pose2d::new(6.9, 4.6, 0.0);
    let piece_two = Pose2d::new(6.9, 3.4, 0.0);
    let bump_grid = Pose2d::new(1.85, 0.5, PI);
    let bump_piece = Pose2d::new(6.9, 0.9, 0.0);
    let middle_grid = Pose2d::new(1.85, 2.75, PI);
    let middle_outside = Pose2d::new(5.8, 2.75, PI);
    let charge_station = Pose2d::new(3.9, 2.75, PI);

    vec![
        PathGroup::new(
            "DriveForward",
            vec![segment("DriveForward", 3, grid, Pose2d::new(4.85, 4.45, PI))],
        ),
        PathGroup::new(
            "BumpOnePickUp",
            vec![segment("BumpOnePickUp", 5, bump_grid, bump_piece)],
        ),
        PathGroup::new(
            "BottomDriveForward",
            vec![segment("BottomDriveForward", 6, bump_grid, bump_piece)],
        ),
        PathGroup::new(
            "SubstationThree",
            vec![
                segment("SubstationThree.0", 3, grid, piece_one),
                segment("SubstationThree.1", 3, piece_one, Pose2d::new(1.85, 3.9, PI)),
                segment("SubstationThree.2", 3, Pose2d::new(1.85, 3.9, PI), piece_two),
            ],
        ),
        PathGroup::new(
            "MiddleTwoConeNoBalance",
            vec![segment("MiddleTwoConeNoBalance", 4, middle_grid, middle_outside)],
        ),
        PathGroup::new(
            "MiddleTwoConeBottomBalance",
            vec![segment("MiddleTwoConeBottomBalance", 5, middle_grid, charge_station)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionContext;

    #[test]
    fn sim_robot_starts_disabled_and_stowed() {
        let mut robot = build_sim_robot(&ControlConfig::default());
        assert!(!robot.is_enabled());
        robot.actuate(Duration::from_millis(20));
        assert!(robot.superstructure.is_at_setpoint());
    }

    #[test]
    fn demo_paths_are_continuous() {
        for group in demo_paths() {
            for pair in group.segments().windows(2) {
                assert_eq!(pair[0].final_pose(), pair[1].initial_pose(), "{}", group.name());
            }
        }
    }
}
