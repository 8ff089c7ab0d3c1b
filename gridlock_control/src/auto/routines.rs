//! Routine catalogue.
//!
//! Each routine is a `Sequence` of setup, scoring, driving and pickup blocks.
//! Setpoint actions are bounded by timeouts from `AutoTimings` (or by the
//! fixed budgets of the older routines): when a budget runs out the routine
//! moves on whether or not the setpoint was reached.
//!
//! `SubstationThree`:
//!
//! ```text
//! odometry, plot
//! score cone high ─▶ stow
//! vision pipeline = cube
//! deadline { race(remaining seg0 + slack) { takeover(follow seg0 → vision drive) }, wait ─▶ intake }
//! all { follow seg1, hold stow (timeout) }
//! score cube high ─▶ stow
//! deadline { race(remaining seg2 + slack) { takeover(follow seg2 → vision drive) }, wait ─▶ intake }
//! brake, stop
//! ```
//!
//! The pickup drive ends with the path when no target was seen. Once vision
//! has taken over it runs until the follower's remaining time plus the slack.

use std::time::Duration;

use gridlock_common::auto::{AutoTimings, secs};
use gridlock_common::superstructure::{GripperState, Setpoint};

use super::path::{PathFollowerFactory, PathGroup, PathSegment, ResolvedPath};
use super::RoutineError;
use crate::action::{Action, ActionExt, BoxedAction, Wait};
use crate::actions::{
    AutoBalance, DriveWithVision, PlotTrajectory, RunGripper, SetGripperState, SetNeutralMode,
    SetOdometry, SetSetpoint, SetVisionPipeline, StopDrivetrain,
};
use crate::combinator::{DelayedTakeover, ParallelAll, ParallelDeadline, ParallelRace, Sequence};
use crate::robot::{NeutralMode, Pipeline, Robot};

type Block = Result<BoxedAction<Robot>, RoutineError>;

/// The routine catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    DoNothing,
    DriveForward,
    BumpOnePickUp,
    BottomDriveForward,
    SubstationThree,
    MiddleTwoConeNoBalance,
    MiddleTwoConeBottomBalance,
}

impl RoutineKind {
    pub const ALL: [RoutineKind; 7] = [
        RoutineKind::DoNothing,
        RoutineKind::DriveForward,
        RoutineKind::BumpOnePickUp,
        RoutineKind::BottomDriveForward,
        RoutineKind::SubstationThree,
        RoutineKind::MiddleTwoConeNoBalance,
        RoutineKind::MiddleTwoConeBottomBalance,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            RoutineKind::DoNothing => "DoNothing",
            RoutineKind::DriveForward => "DriveForward",
            RoutineKind::BumpOnePickUp => "BumpOnePickUp",
            RoutineKind::BottomDriveForward => "BottomDriveForward",
            RoutineKind::SubstationThree => "SubstationThree",
            RoutineKind::MiddleTwoConeNoBalance => "MiddleTwoConeNoBalance",
            RoutineKind::MiddleTwoConeBottomBalance => "MiddleTwoConeBottomBalance",
        }
    }

    /// Path segments the routine follows.
    pub const fn segments_needed(self) -> usize {
        match self {
            RoutineKind::DoNothing => 0,
            RoutineKind::SubstationThree => 3,
            _ => 1,
        }
    }

    /// Assemble the routine.
    ///
    /// `path` is the group resolved for the alliance, see `find_path`
    /// (ignored by `DoNothing`). `path_name` names the routine and its plot.
    pub fn build(
        self,
        path_name: &str,
        path: Option<ResolvedPath<'_>>,
        follower: &dyn PathFollowerFactory<Robot>,
        timings: &AutoTimings,
    ) -> Block {
        let route = || Route::new(path_name, path, follower);
        let body = match self {
            RoutineKind::DoNothing => return Ok(wait(Duration::ZERO)),
            RoutineKind::DriveForward => drive_forward(&route()?)?,
            RoutineKind::BumpOnePickUp => bump_one_pick_up(&route()?, timings)?,
            RoutineKind::BottomDriveForward => bottom_drive_forward(&route()?)?,
            RoutineKind::SubstationThree => substation_three(&route()?, timings)?,
            RoutineKind::MiddleTwoConeNoBalance => middle_two_cone(&route()?, false)?,
            RoutineKind::MiddleTwoConeBottomBalance => middle_two_cone(&route()?, true)?,
        };
        Ok(Sequence::new(body)?.named(path_name).boxed())
    }
}

// ─── Building Blocks ────────────────────────────────────────────────

/// Alliance-resolved path plus the follower factory.
struct Route<'a> {
    name: &'a str,
    group: PathGroup,
    follower: &'a dyn PathFollowerFactory<Robot>,
}

impl<'a> Route<'a> {
    fn new(
        name: &'a str,
        path: Option<ResolvedPath<'_>>,
        follower: &'a dyn PathFollowerFactory<Robot>,
    ) -> Result<Self, RoutineError> {
        let path = path.ok_or_else(|| RoutineError::MissingPath(name.to_string()))?;
        let group = path.to_group();
        // Fail on an empty group before anything is built.
        group.initial_pose()?;
        Ok(Self {
            name,
            group,
            follower,
        })
    }

    fn segment(&self, index: usize) -> Result<&PathSegment, RoutineError> {
        self.group.segment(index)
    }

    fn follow(&self, index: usize) -> Block {
        Ok(self.follower.follow(self.segment(index)?).boxed())
    }

    /// Odometry reset to the path start, then the field plot.
    fn setup(&self) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
        Ok(vec![
            SetOdometry::new(self.group.initial_pose()?).boxed(),
            PlotTrajectory::new(self.name, self.group.plot_poses()).boxed(),
        ])
    }
}

fn timed(action: impl Action<Robot> + 'static, budget: Duration) -> Block {
    Ok(action.with_timeout(budget)?.boxed())
}

fn all(children: Vec<BoxedAction<Robot>>) -> Block {
    Ok(ParallelAll::new(children)?.boxed())
}

fn wait(duration: Duration) -> BoxedAction<Robot> {
    Wait::new(duration).boxed()
}

fn brake_and_stop() -> [BoxedAction<Robot>; 2] {
    [
        SetNeutralMode::new(NeutralMode::Brake).boxed(),
        StopDrivetrain.boxed(),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Piece {
    Cone,
    Cube,
}

/// Raise, place and stow one game piece on the high node.
fn score_high(piece: Piece, t: &AutoTimings) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    let (setpoint, holding, scoring, raise, settle, release, stow) = match piece {
        Piece::Cone => (
            Setpoint::ScoreHighCone,
            GripperState::HoldingCone,
            GripperState::ScoringCone,
            t.score_high_cone(),
            t.wait_to_place_cone(),
            t.scoring_cone(),
            t.stow_high_cone(),
        ),
        Piece::Cube => (
            Setpoint::ScoreHighCube,
            GripperState::HoldingCube,
            GripperState::ScoringCube,
            t.score_high_cube(),
            t.wait_to_place_cube(),
            t.scoring_cube(),
            t.stow_high_cube(),
        ),
    };
    Ok(vec![
        ParallelAll::new(vec![
            SetSetpoint::until_reached(setpoint).boxed(),
            SetGripperState::new(holding).boxed(),
        ])?
        .named(format!("Raise{piece:?}"))
        .with_timeout(raise)?
        .boxed(),
        wait(settle),
        timed(SetGripperState::new(scoring), release)?,
        wait(release),
        ParallelAll::new(vec![
            SetSetpoint::until_reached(Setpoint::Stowed).boxed(),
            SetGripperState::new(GripperState::None).boxed(),
        ])?
        .named("Stow")
        .with_timeout(stow)?
        .boxed(),
    ])
}

/// Follow a segment, handing over to vision driving once a cube is seen,
/// while the intake deploys after `intake_delay`. The drive is a race
/// bounded by the follower's remaining time plus `slack`; the intake runs
/// for as long as the drive does.
fn pick_up_cube(
    route: &Route<'_>,
    index: usize,
    slack: Duration,
    takeover_delay: Duration,
    t: &AutoTimings,
) -> Block {
    let segment = route.segment(index)?;
    let follow = route.follower.follow(segment);
    let budget = follow.remaining_duration(Duration::ZERO) + slack;
    let takeover = DelayedTakeover::new(
        follow.boxed(),
        DriveWithVision::new(1.0).boxed(),
        takeover_delay,
        |robot: &Robot| robot.vision.has_valid_target(),
    )?
    .named(format!("Takeover({})", segment.name()))
    .boxed();
    let drive = ParallelRace::new(vec![takeover], Some(budget))?
        .named(format!("Drive({})", segment.name()))
        .boxed();
    let intake = Sequence::new(vec![
        wait(t.intake_delay()),
        all(vec![
            SetSetpoint::until_reached(Setpoint::IntakingLowCube).boxed(),
            SetGripperState::new(GripperState::IntakingCube).boxed(),
        ])?,
    ])?
    .named("DeployIntake")
    .boxed();
    Ok(ParallelDeadline::new(drive, vec![intake])?
        .named(format!("PickUpCube({index})"))
        .boxed())
}

// ─── Routines ───────────────────────────────────────────────────────

fn drive_forward(route: &Route<'_>) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    let mut steps = route.setup()?;
    steps.push(route.follow(0)?);
    steps.extend(brake_and_stop());
    Ok(steps)
}

fn bump_one_pick_up(
    route: &Route<'_>,
    t: &AutoTimings,
) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    let mut steps = route.setup()?;
    steps.extend([
        all(vec![
            timed(SetSetpoint::until_reached(Setpoint::ScoreHighCone), t.score_high_cone())?,
            timed(SetGripperState::new(GripperState::HoldingCone), t.score_high_cone())?,
        ])?,
        wait(t.wait_to_place_cone()),
        timed(SetGripperState::new(GripperState::ScoringCone), t.scoring_cone())?,
        wait(t.scoring_cone()),
        all(vec![
            timed(SetSetpoint::until_reached(Setpoint::Stowed), t.stow_high_cone())?,
            timed(SetGripperState::new(GripperState::None), t.stow_high_cone())?,
        ])?,
        wait(t.stow_high_cone()),
        ParallelDeadline::new(
            route.follow(0)?,
            vec![Sequence::new(vec![
                wait(secs(3.0)),
                all(vec![
                    timed(SetSetpoint::until_reached(Setpoint::IntakingLowCube), secs(2.0))?,
                    timed(SetGripperState::new(GripperState::IntakingCube), secs(2.0))?,
                ])?,
            ])?
            .boxed()],
        )?
        .boxed(),
        all(vec![
            timed(SetSetpoint::hold(Setpoint::Stowed), secs(0.5))?,
            timed(SetGripperState::new(GripperState::HoldingCube), secs(0.5))?,
        ])?,
    ]);
    steps.extend(brake_and_stop());
    Ok(steps)
}

fn bottom_drive_forward(route: &Route<'_>) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    let mut steps = route.setup()?;
    steps.extend([
        all(vec![
            timed(SetSetpoint::until_reached(Setpoint::ScoreHighCone), secs(2.0))?,
            timed(RunGripper::new(0.5), secs(2.0))?,
        ])?,
        wait(secs(1.1)),
        timed(RunGripper::new(-0.8), secs(1.0))?,
        all(vec![
            timed(SetSetpoint::until_reached(Setpoint::Stowed), secs(1.8))?,
            timed(RunGripper::new(0.0), secs(1.8))?,
        ])?,
        wait(secs(0.48)),
        ParallelDeadline::new(
            route.follow(0)?,
            vec![Sequence::new(vec![
                wait(secs(5.0)),
                all(vec![
                    timed(SetSetpoint::hold(Setpoint::IntakingLowCube), secs(2.0))?,
                    timed(RunGripper::new(0.5), secs(2.0))?,
                ])?,
            ])?
            .boxed()],
        )?
        .boxed(),
        all(vec![
            timed(SetSetpoint::hold(Setpoint::Stowed), secs(0.5))?,
            timed(RunGripper::new(0.0), secs(0.5))?,
        ])?,
    ]);
    steps.extend(brake_and_stop());
    Ok(steps)
}

fn substation_three(
    route: &Route<'_>,
    t: &AutoTimings,
) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    // Check every segment up front so a short path fails as a whole.
    route.segment(2)?;

    let mut steps = route.setup()?;
    steps.extend(score_high(Piece::Cone, t)?);
    steps.push(SetVisionPipeline::new(Pipeline::Cube).boxed());
    steps.push(pick_up_cube(
        route,
        0,
        t.path_slack_first(),
        t.takeover_delay_first(),
        t,
    )?);
    steps.push(all(vec![
        route.follow(1)?,
        timed(SetSetpoint::hold(Setpoint::Stowed), t.intake_to_stow())?,
    ])?);
    steps.extend(score_high(Piece::Cube, t)?);
    steps.push(pick_up_cube(
        route,
        2,
        t.path_slack_second(),
        t.takeover_delay_second(),
        t,
    )?);
    steps.extend(brake_and_stop());
    Ok(steps)
}

/// Upper bound on leveling at the end of the middle routine.
const BALANCE_BUDGET: Duration = Duration::from_secs(6);

/// Drive the middle path and park. With `balance`, level on the charge
/// station afterwards.
fn middle_two_cone(
    route: &Route<'_>,
    balance: bool,
) -> Result<Vec<BoxedAction<Robot>>, RoutineError> {
    let mut steps = route.setup()?;
    steps.push(route.follow(0)?);
    steps.extend(brake_and_stop());
    if balance {
        steps.push(timed(AutoBalance::default(), BALANCE_BUDGET)?);
    }
    Ok(steps)
}
