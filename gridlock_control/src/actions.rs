//! Robot leaf actions.
//!
//! Each action touches the robot only through the `Robot` context and
//! declares the resources it writes. Instant actions do their work in
//! `start()` and finish on their first step.

use std::f64::consts::PI;
use std::time::Duration;

use gridlock_common::resource::ResourceSet;
use gridlock_common::superstructure::{GripperState, Setpoint, Zone};
use tracing::debug;

use crate::action::{Action, ActionContext, InterruptPolicy, Timer};
use crate::bindings::Axis;
use crate::robot::{ChassisSpeeds, NeutralMode, Pipeline, Pose2d, Robot};

/// Top translational speed for operator and vision driving [m/s].
pub const MAX_SPEED_MPS: f64 = 4.0;
/// Top rotational speed for operator driving [rad/s].
pub const MAX_ANGULAR_RPS: f64 = 2.0 * PI;
/// Stick deflection below which operator input is ignored.
pub const STICK_DEADBAND: f64 = 0.05;

// ─── Superstructure ─────────────────────────────────────────────────

/// When a `SetSetpoint` finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointMode {
    /// Finished once lift and wrist are inside tolerance.
    UntilReached,
    /// Keeps requesting the setpoint until cancelled.
    Hold,
}

/// Request a superstructure setpoint.
pub struct SetSetpoint {
    name: String,
    setpoint: Setpoint,
    mode: SetpointMode,
}

impl SetSetpoint {
    pub fn new(setpoint: Setpoint, mode: SetpointMode) -> Self {
        Self {
            name: format!("SetSetpoint({setpoint:?})"),
            setpoint,
            mode,
        }
    }

    pub fn until_reached(setpoint: Setpoint) -> Self {
        Self::new(setpoint, SetpointMode::UntilReached)
    }

    pub fn hold(setpoint: Setpoint) -> Self {
        Self::new(setpoint, SetpointMode::Hold)
    }
}

impl Action<Robot> for SetSetpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::SUPERSTRUCTURE
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.superstructure.request_setpoint(self.setpoint);
    }

    fn step(&mut self, ctx: &mut Robot) {
        ctx.superstructure.request_setpoint(self.setpoint);
    }

    fn is_finished(&self, ctx: &Robot) -> bool {
        match self.mode {
            SetpointMode::UntilReached => ctx.superstructure.is_at_setpoint(),
            SetpointMode::Hold => false,
        }
    }
}

// ─── Gripper ────────────────────────────────────────────────────────

/// Switch the gripper to a named state. The state persists after finishing.
pub struct SetGripperState {
    name: String,
    state: GripperState,
}

impl SetGripperState {
    pub fn new(state: GripperState) -> Self {
        Self {
            name: format!("SetGripperState({state:?})"),
            state,
        }
    }
}

impl Action<Robot> for SetGripperState {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::GRIPPER
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.superstructure.set_gripper_output(None);
        ctx.superstructure.set_gripper_state(self.state);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

/// Run the gripper rollers at a fixed output until cancelled.
///
/// On stop the rollers return to the `None` state.
pub struct RunGripper {
    name: String,
    output: f64,
}

impl RunGripper {
    pub fn new(output: f64) -> Self {
        Self {
            name: format!("RunGripper({output:+.2})"),
            output,
        }
    }

    pub fn output(&self) -> f64 {
        self.output
    }
}

impl Action<Robot> for RunGripper {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::GRIPPER
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.superstructure.set_gripper_output(Some(self.output));
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        false
    }

    fn stop(&mut self, ctx: &mut Robot, _interrupted: bool) {
        ctx.superstructure.set_gripper_output(None);
        ctx.superstructure.set_gripper_state(GripperState::None);
    }
}

// ─── Field & Odometry ───────────────────────────────────────────────

/// Show a trajectory on the field plot. Runs while disabled.
pub struct PlotTrajectory {
    path_name: String,
    poses: Vec<Pose2d>,
}

impl PlotTrajectory {
    pub fn new(path_name: impl Into<String>, poses: Vec<Pose2d>) -> Self {
        Self {
            path_name: path_name.into(),
            poses,
        }
    }
}

impl Action<Robot> for PlotTrajectory {
    fn name(&self) -> &str {
        "PlotTrajectory"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::FIELD
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.field.set_trajectory(&self.path_name, &self.poses);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

/// Reset drivetrain odometry to a known pose.
pub struct SetOdometry {
    pose: Pose2d,
}

impl SetOdometry {
    pub fn new(pose: Pose2d) -> Self {
        Self { pose }
    }
}

impl Action<Robot> for SetOdometry {
    fn name(&self) -> &str {
        "SetOdometry"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut Robot) {
        debug!(x = self.pose.x, y = self.pose.y, heading = self.pose.heading, "odometry reset");
        ctx.drivetrain.reset_odometry(self.pose);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

// ─── Status Light ───────────────────────────────────────────────────

/// Show the superstructure zone on the status light, or `Disabled` while the
/// robot is disabled. Default action of the signal resource; never finishes.
#[derive(Debug, Default)]
pub struct SignalZone;

impl SignalZone {
    fn show(ctx: &mut Robot) {
        let zone = if ctx.is_enabled() {
            ctx.superstructure.current_zone()
        } else {
            Zone::Disabled
        };
        ctx.indicator.show(zone);
    }
}

impl Action<Robot> for SignalZone {
    fn name(&self) -> &str {
        "SignalZone"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::SIGNAL
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut Robot) {
        Self::show(ctx);
    }

    fn step(&mut self, ctx: &mut Robot) {
        Self::show(ctx);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        false
    }
}

// ─── Drivetrain ─────────────────────────────────────────────────────

pub struct SetNeutralMode {
    mode: NeutralMode,
}

impl SetNeutralMode {
    pub fn new(mode: NeutralMode) -> Self {
        Self { mode }
    }
}

impl Action<Robot> for SetNeutralMode {
    fn name(&self) -> &str {
        "SetNeutralMode"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.drivetrain.set_neutral_mode(self.mode);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

/// Command zero chassis speeds.
pub struct StopDrivetrain;

impl Action<Robot> for StopDrivetrain {
    fn name(&self) -> &str {
        "StopDrivetrain"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.drivetrain.stop();
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

/// Operator field driving from the stick axes. Default drivetrain action.
#[derive(Debug, Default)]
pub struct TeleopDrive;

fn deadband(value: f64) -> f64 {
    if value.abs() < STICK_DEADBAND {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

impl Action<Robot> for TeleopDrive {
    fn name(&self) -> &str {
        "TeleopDrive"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn step(&mut self, ctx: &mut Robot) {
        // Stick forward reads negative.
        let speeds = ChassisSpeeds::new(
            -deadband(ctx.input.axis(Axis::LeftY)) * MAX_SPEED_MPS,
            -deadband(ctx.input.axis(Axis::LeftX)) * MAX_SPEED_MPS,
            -deadband(ctx.input.axis(Axis::RightX)) * MAX_ANGULAR_RPS,
        );
        ctx.drivetrain.drive(speeds);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        false
    }

    fn stop(&mut self, ctx: &mut Robot, _interrupted: bool) {
        ctx.drivetrain.stop();
    }
}

// ─── Vision ─────────────────────────────────────────────────────────

pub struct SetVisionPipeline {
    pipeline: Pipeline,
}

impl SetVisionPipeline {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

impl Action<Robot> for SetVisionPipeline {
    fn name(&self) -> &str {
        "SetVisionPipeline"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::VISION
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut Robot) {
        ctx.vision.set_pipeline(self.pipeline);
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        true
    }
}

/// Drive forward at a fixed throttle while steering onto the vision target.
pub struct DriveWithVision {
    throttle: f64,
}

impl DriveWithVision {
    /// Heading gain [rad/s per degree of target offset].
    pub const STEER_GAIN: f64 = 0.05;

    pub fn new(throttle: f64) -> Self {
        Self {
            throttle: throttle.clamp(-1.0, 1.0),
        }
    }
}

impl Action<Robot> for DriveWithVision {
    fn name(&self) -> &str {
        "DriveWithVision"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn step(&mut self, ctx: &mut Robot) {
        let omega = ctx
            .vision
            .target_offset()
            .map_or(0.0, |offset| offset * Self::STEER_GAIN)
            .clamp(-MAX_ANGULAR_RPS, MAX_ANGULAR_RPS);
        ctx.drivetrain
            .drive(ChassisSpeeds::new(self.throttle * MAX_SPEED_MPS, 0.0, omega));
    }

    fn is_finished(&self, _ctx: &Robot) -> bool {
        false
    }

    fn stop(&mut self, ctx: &mut Robot, _interrupted: bool) {
        ctx.drivetrain.stop();
    }
}

// ─── Balance ────────────────────────────────────────────────────────

/// Level the robot on the charge station.
///
/// Drives against the measured roll and finishes only after the roll has
/// stayed inside `tolerance` for `settle` without interruption. Keeps the
/// drivetrain against incoming requests.
pub struct AutoBalance {
    tolerance_deg: f64,
    settle: Duration,
    gain: f64,
    level: Timer,
}

impl Default for AutoBalance {
    fn default() -> Self {
        Self::new(2.0, Duration::from_secs(2))
    }
}

impl AutoBalance {
    /// Forward speed per degree of roll [m/s/deg].
    const GAIN: f64 = 0.03;
    /// Balancing speed limit [m/s].
    const MAX_SPEED: f64 = 0.6;

    pub fn new(tolerance_deg: f64, settle: Duration) -> Self {
        Self {
            tolerance_deg,
            settle,
            gain: Self::GAIN,
            level: Timer::new(),
        }
    }
}

impl Action<Robot> for AutoBalance {
    fn name(&self) -> &str {
        "AutoBalance"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::DRIVETRAIN
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        InterruptPolicy::CancelIncoming
    }

    fn start(&mut self, ctx: &mut Robot) {
        self.level = Timer::new();
        ctx.drivetrain.set_neutral_mode(NeutralMode::Brake);
    }

    fn step(&mut self, ctx: &mut Robot) {
        let now = ctx.now();
        let roll = ctx.drivetrain.roll();
        if roll.abs() <= self.tolerance_deg {
            if !self.level.is_running() {
                self.level.start(now);
            }
            ctx.drivetrain.stop();
        } else {
            self.level = Timer::new();
            let vx = (-roll * self.gain).clamp(-Self::MAX_SPEED, Self::MAX_SPEED);
            ctx.drivetrain.drive(ChassisSpeeds::new(vx, 0.0, 0.0));
        }
    }

    fn is_finished(&self, ctx: &Robot) -> bool {
        self.level.is_running() && self.level.has_elapsed(ctx.now(), self.settle)
    }

    fn stop(&mut self, ctx: &mut Robot, _interrupted: bool) {
        self.level.stop(ctx.now());
        ctx.drivetrain.stop();
    }
}
