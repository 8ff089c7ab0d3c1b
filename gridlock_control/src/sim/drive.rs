//! Simulated drivetrain and timed path follower.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gridlock_common::resource::ResourceSet;

use crate::action::{Action, ActionContext, Timer};
use crate::auto::path::{PathFollow, PathFollowerFactory, PathSegment};
use crate::robot::{ChassisSpeeds, DriveBase, NeutralMode, Pose2d, Robot};

// ─── Drivetrain ─────────────────────────────────────────────────────

/// Holonomic drivetrain that integrates commanded speeds perfectly.
#[derive(Debug, Clone, Default)]
pub struct SimDrive {
    pose: Pose2d,
    speeds: ChassisSpeeds,
    neutral: NeutralMode,
    roll: Rc<Cell<f64>>,
}

impl SimDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the simulated roll [deg].
    pub fn roll_handle(&self) -> Rc<Cell<f64>> {
        Rc::clone(&self.roll)
    }
}

impl DriveBase for SimDrive {
    fn pose(&self) -> Pose2d {
        self.pose
    }

    fn reset_odometry(&mut self, pose: Pose2d) {
        self.pose = pose;
    }

    fn drive(&mut self, speeds: ChassisSpeeds) {
        self.speeds = speeds;
    }

    fn speeds(&self) -> ChassisSpeeds {
        self.speeds
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) {
        self.neutral = mode;
    }

    fn neutral_mode(&self) -> NeutralMode {
        self.neutral
    }

    fn roll(&self) -> f64 {
        self.roll.get()
    }

    fn periodic(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        let (sin, cos) = self.pose.heading.sin_cos();
        let ChassisSpeeds { vx, vy, omega } = self.speeds;
        self.pose.x += (vx * cos - vy * sin) * dt;
        self.pose.y += (vx * sin + vy * cos) * dt;
        self.pose.heading += omega * dt;
    }
}

// ─── Path Follower ──────────────────────────────────────────────────

/// Drives a segment open-loop at the constant speed that covers it in its
/// nominal duration. Finishes when the duration has elapsed.
pub struct TimedPathFollower {
    name: String,
    segment: PathSegment,
    timer: Timer,
}

impl TimedPathFollower {
    pub fn new(segment: PathSegment) -> Self {
        Self {
            name: format!("FollowPath({})", segment.name()),
            segment,
            timer: Timer::new(),
        }
    }

    fn field_speeds(&self) -> (f64, f64, f64) {
        let secs = self.segment.total_duration().as_secs_f64();
        if secs <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let (a, b) = (self.segment.initial_pose(), self.segment.final_pose());
        ((b.x - a.x) / secs, (b.y - a.y) / secs, (b.heading - a.heading) / secs)
    }
}

impl Action<Robot> for TimedPathFollower {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn start(&mut self, ctx: &mut Robot) {
        self.timer.restart(ctx.now());
    }

    fn step(&mut self, ctx: &mut Robot) {
        let (fx, fy, omega) = self.field_speeds();
        let (sin, cos) = ctx.drivetrain.pose().heading.sin_cos();
        // Field frame to robot frame.
        let speeds = ChassisSpeeds::new(fx * cos + fy * sin, -fx * sin + fy * cos, omega);
        ctx.drivetrain.drive(speeds);
    }

    fn is_finished(&self, ctx: &Robot) -> bool {
        self.timer.has_elapsed(ctx.now(), self.segment.total_duration())
    }

    fn stop(&mut self, ctx: &mut Robot, _interrupted: bool) {
        self.timer.stop(ctx.now());
        ctx.drivetrain.stop();
    }
}

impl PathFollow<Robot> for TimedPathFollower {
    fn remaining_duration(&self, now: Duration) -> Duration {
        self.segment
            .total_duration()
            .saturating_sub(self.timer.elapsed(now))
    }
}

/// Factory for `TimedPathFollower`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedPathFollowerFactory;

impl PathFollowerFactory<Robot> for TimedPathFollowerFactory {
    fn follow(&self, segment: &PathSegment) -> Box<dyn PathFollow<Robot>> {
        Box::new(TimedPathFollower::new(segment.clone()))
    }
}
