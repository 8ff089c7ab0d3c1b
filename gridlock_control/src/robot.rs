//! Robot context: everything an action can reach during a tick.
//!
//! `Robot` is the `ActionContext` of the real control loop. It owns the
//! superstructure coordinator, the drivetrain, the vision source, the status
//! light, the field plot and the latest operator input snapshot. The host loop drives it as
//! `sense()` → `Scheduler::tick()` → `actuate()`.

use std::f64::consts::PI;
use std::time::Duration;

use gridlock_common::superstructure::Zone;
use serde::Serialize;
use tracing::info;

use crate::action::ActionContext;
use crate::bindings::InputState;
use crate::superstructure::Superstructure;

/// Length of the field along the alliance axis [m].
pub const FIELD_LENGTH_M: f64 = 16.54;

// ─── Geometry ───────────────────────────────────────────────────────

/// Field-relative pose. Heading in radians, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Pose2d {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose2d {
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Mirror onto the other alliance's half of the field.
    pub fn mirrored(self) -> Self {
        let heading = PI - self.heading;
        Self {
            x: FIELD_LENGTH_M - self.x,
            y: self.y,
            heading: heading.rem_euclid(2.0 * PI),
        }
    }
}

/// Robot-relative velocity command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChassisSpeeds {
    /// Forward [m/s].
    pub vx: f64,
    /// Left [m/s].
    pub vy: f64,
    /// Counter-clockwise [rad/s].
    pub omega: f64,
}

impl ChassisSpeeds {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        omega: 0.0,
    };

    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NeutralMode {
    #[default]
    Coast,
    Brake,
}

/// Vision processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Pipeline {
    #[default]
    AprilTag,
    Cube,
    Cone,
}

// ─── Collaborators ──────────────────────────────────────────────────

/// Holonomic drivetrain.
pub trait DriveBase {
    fn pose(&self) -> Pose2d;
    fn reset_odometry(&mut self, pose: Pose2d);
    fn drive(&mut self, speeds: ChassisSpeeds);
    /// Last commanded speeds.
    fn speeds(&self) -> ChassisSpeeds;
    fn stop(&mut self) {
        self.drive(ChassisSpeeds::ZERO);
    }
    fn set_neutral_mode(&mut self, mode: NeutralMode);
    fn neutral_mode(&self) -> NeutralMode;
    /// Chassis roll [deg], positive when the front is up.
    fn roll(&self) -> f64 {
        0.0
    }
    fn periodic(&mut self, _dt: Duration) {}
}

/// Game-piece camera.
pub trait VisionSource {
    fn set_pipeline(&mut self, pipeline: Pipeline);
    fn pipeline(&self) -> Pipeline;
    /// True when the active pipeline currently sees a target. Side-effect free.
    fn has_valid_target(&self) -> bool;
    /// Horizontal angle to the target [deg], positive to the left.
    fn target_offset(&self) -> Option<f64>;
    fn periodic(&mut self, _dt: Duration) {}
}

/// Solid colour of the status light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalColor {
    Red,
    Green,
    Orange,
    White,
    Pink,
    Blue,
}

impl SignalColor {
    pub const fn for_zone(zone: Zone) -> Self {
        match zone {
            Zone::Disabled => SignalColor::Red,
            Zone::Enabled => SignalColor::Green,
            Zone::Low => SignalColor::Orange,
            Zone::Mid => SignalColor::White,
            Zone::High => SignalColor::Pink,
            Zone::Extended => SignalColor::Blue,
        }
    }
}

/// Operator-facing status light.
pub trait StatusIndicator {
    /// Show `zone`. Showing the zone already on display changes nothing.
    fn show(&mut self, zone: Zone);
    /// Zone on display, `None` before the first `show`.
    fn shown(&self) -> Option<Zone>;
    fn color(&self) -> Option<SignalColor> {
        self.shown().map(SignalColor::for_zone)
    }
}

// ─── Field Plot ─────────────────────────────────────────────────────

/// Trajectory shown on the field visualization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldPlot {
    name: Option<String>,
    poses: Vec<Pose2d>,
}

impl FieldPlot {
    /// Replace the plotted trajectory. Poses are field coordinates of the
    /// alliance being driven.
    pub fn set_trajectory(&mut self, name: &str, poses: &[Pose2d]) {
        self.poses = poses.to_vec();
        self.name = Some(name.to_string());
    }

    pub fn clear(&mut self) {
        self.name = None;
        self.poses.clear();
    }

    pub fn trajectory_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn poses(&self) -> &[Pose2d] {
        &self.poses
    }
}

// ─── Robot ──────────────────────────────────────────────────────────

pub struct Robot {
    now: Duration,
    enabled: bool,
    pub superstructure: Superstructure,
    pub drivetrain: Box<dyn DriveBase>,
    pub vision: Box<dyn VisionSource>,
    pub indicator: Box<dyn StatusIndicator>,
    pub field: FieldPlot,
    pub input: InputState,
}

impl Robot {
    pub fn new(
        superstructure: Superstructure,
        drivetrain: Box<dyn DriveBase>,
        vision: Box<dyn VisionSource>,
        indicator: Box<dyn StatusIndicator>,
    ) -> Self {
        Self {
            now: Duration::ZERO,
            enabled: false,
            superstructure,
            drivetrain,
            vision,
            indicator,
            field: FieldPlot::default(),
            input: InputState::default(),
        }
    }

    /// Set the tick timestamp. Must not go backwards.
    pub fn set_time(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            info!(enabled, "robot enable changed");
            self.enabled = enabled;
        }
    }

    /// Pre-tick: refresh derived state read by triggers and actions.
    pub fn sense(&mut self) {
        self.superstructure.update_zone(self.enabled);
    }

    /// Post-tick: push commands to hardware and advance collaborators.
    pub fn actuate(&mut self, dt: Duration) {
        if !self.enabled {
            self.drivetrain.stop();
            self.superstructure.set_gripper_output(Some(0.0));
        }
        self.superstructure.apply(dt);
        if !self.enabled {
            self.superstructure.set_gripper_output(None);
        }
        self.drivetrain.periodic(dt);
        self.vision.periodic(dt);
    }
}

impl ActionContext for Robot {
    fn now(&self) -> Duration {
        self.now
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
