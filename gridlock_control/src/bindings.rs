//! Operator input and trigger bindings.
//!
//! The host loop writes a fresh `InputState` into the robot before every
//! tick. Bindings are predicates over that snapshot, registered with the
//! scheduler once at startup.
//!
//! | Input | Mode | Action |
//! |-------|------|--------|
//! | A / B / X / Y | while held | hold `SCORE_LOW_CONE` / `SCORE_MID_CONE` / `STOWED` / `SCORE_HIGH_CONE` |
//! | left trigger > 0.1 | while held | intake |
//! | right trigger > 0.1 | while held | reverse intake |
//! | balance button | while held | `AutoBalance` (keeps the drivetrain) |
//! | (default) | | `TeleopDrive` on the drivetrain |
//! | (default) | | `SignalZone` on the status light, also while disabled |

use bitflags::bitflags;
use gridlock_common::resource::ResourceId;
use gridlock_common::superstructure::Setpoint;

use crate::action::ActionExt;
use crate::actions::{AutoBalance, RunGripper, SetSetpoint, SignalZone, TeleopDrive};
use crate::robot::Robot;
use crate::scheduler::{ActionId, Scheduler, SchedulerError, Trigger};

/// Analog trigger deflection that counts as pressed.
pub const TRIGGER_THRESHOLD: f64 = 0.1;

/// Roller output of the manual intake bindings.
pub const MANUAL_INTAKE_OUTPUT: f64 = 0.8;

bitflags! {
    /// Digital operator buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u16 {
        const A            = 1 << 0;
        const B            = 1 << 1;
        const X            = 1 << 2;
        const Y            = 1 << 3;
        const LEFT_BUMPER  = 1 << 4;
        const RIGHT_BUMPER = 1 << 5;
        const BACK         = 1 << 6;
        const START        = 1 << 7;
        /// Driver joystick trigger.
        const BALANCE      = 1 << 8;
    }
}

/// Analog operator axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl Axis {
    pub const COUNT: usize = 6;

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// One sample of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub buttons: Buttons,
    axes: [f64; Axis::COUNT],
}

impl InputState {
    #[inline]
    pub fn is_pressed(&self, buttons: Buttons) -> bool {
        self.buttons.contains(buttons)
    }

    pub fn set_pressed(&mut self, buttons: Buttons, pressed: bool) {
        self.buttons.set(buttons, pressed);
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        self.axes[axis.index()]
    }

    /// Set an axis, clamped to [-1.0, 1.0]. Non-finite values read as 0.
    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        self.axes[axis.index()] = if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }
}

/// Ids of the actions installed by `configure_bindings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub setpoints: Vec<(Buttons, ActionId)>,
    pub intake: ActionId,
    pub reverse_intake: ActionId,
    pub balance: ActionId,
    pub drive: ActionId,
    pub signal: ActionId,
}

fn button(buttons: Buttons) -> Trigger<Robot> {
    Trigger::while_true(move |robot: &Robot| robot.input.is_pressed(buttons))
}

fn axis_above(axis: Axis, threshold: f64) -> Trigger<Robot> {
    Trigger::while_true(move |robot: &Robot| robot.input.axis(axis) > threshold)
}

/// Install the operator bindings and the drivetrain and status light
/// defaults.
pub fn configure_bindings(scheduler: &mut Scheduler<Robot>) -> Result<Bindings, SchedulerError> {
    let setpoints = [
        (Buttons::A, Setpoint::ScoreLowCone),
        (Buttons::B, Setpoint::ScoreMidCone),
        (Buttons::X, Setpoint::Stowed),
        (Buttons::Y, Setpoint::ScoreHighCone),
    ]
    .into_iter()
    .map(|(b, setpoint)| {
        scheduler
            .bind(SetSetpoint::hold(setpoint).boxed(), button(b))
            .map(|id| (b, id))
    })
    .collect::<Result<Vec<_>, _>>()?;

    let intake = scheduler.bind(
        RunGripper::new(MANUAL_INTAKE_OUTPUT).boxed(),
        axis_above(Axis::LeftTrigger, TRIGGER_THRESHOLD),
    )?;
    let reverse_intake = scheduler.bind(
        RunGripper::new(-MANUAL_INTAKE_OUTPUT).boxed(),
        axis_above(Axis::RightTrigger, TRIGGER_THRESHOLD),
    )?;
    let balance = scheduler.bind(AutoBalance::default().boxed(), button(Buttons::BALANCE))?;
    let drive = scheduler.set_default(ResourceId::DRIVETRAIN, TeleopDrive.boxed())?;
    let signal = scheduler.set_default(ResourceId::SIGNAL, SignalZone.boxed())?;

    Ok(Bindings {
        setpoints,
        intake,
        reverse_intake,
        balance,
        drive,
        signal,
    })
}
