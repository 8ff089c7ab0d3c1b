//! Per-cycle telemetry snapshots.
//!
//! A snapshot is a read-only copy of what the operator dashboard shows: the
//! zone, the status light colour, the requested setpoint, actuator positions and the scheduler's view
//! of every registered action. Sinks receive snapshots every
//! `cycle.telemetry_interval` cycles.

use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use gridlock_common::superstructure::{GripperState, Setpoint, Zone};

use crate::action::ActionContext;
use crate::robot::{Pose2d, Robot, SignalColor};
use crate::scheduler::{ActionStatus, Scheduler};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// State of the robot and scheduler at the end of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub cycle: u64,
    pub time_ms: u64,
    pub enabled: bool,
    pub zone: Zone,
    pub signal: Option<SignalColor>,
    pub desired_setpoint: Setpoint,
    pub at_setpoint: bool,
    pub gripper_state: GripperState,
    pub gripper_output: f64,
    pub lift_position: f64,
    pub wrist_position: f64,
    pub pose: Pose2d,
    pub trajectory: Option<String>,
    pub actions: Vec<ActionStatus>,
}

impl TelemetrySnapshot {
    pub fn capture(scheduler: &Scheduler<Robot>, robot: &Robot) -> Self {
        let superstructure = &robot.superstructure;
        Self {
            cycle: scheduler.cycle(),
            time_ms: u64::try_from(robot.now().as_millis()).unwrap_or(u64::MAX),
            enabled: robot.is_enabled(),
            zone: superstructure.current_zone(),
            signal: robot.indicator.color(),
            desired_setpoint: superstructure.desired_setpoint(),
            at_setpoint: superstructure.is_at_setpoint(),
            gripper_state: superstructure.gripper_state(),
            gripper_output: superstructure.applied_gripper_output(),
            lift_position: superstructure.lift_position(),
            wrist_position: superstructure.wrist_position(),
            pose: robot.drivetrain.pose(),
            trajectory: robot.field.trajectory_name().map(str::to_string),
            actions: scheduler.statuses(),
        }
    }

    /// Names of the actions running at capture time.
    pub fn running(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|a| a.state.is_running())
            .map(|a| a.name.as_str())
    }
}

/// Destination for snapshots.
pub trait TelemetrySink {
    fn publish(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError>;
}

/// Emits a compact summary line through `tracing` at DEBUG.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn publish(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        let running: Vec<&str> = snapshot.running().collect();
        debug!(
            cycle = snapshot.cycle,
            time_ms = snapshot.time_ms,
            zone = ?snapshot.zone,
            setpoint = ?snapshot.desired_setpoint,
            at_setpoint = snapshot.at_setpoint,
            gripper = ?snapshot.gripper_state,
            lift = snapshot.lift_position,
            wrist = snapshot.wrist_position,
            ?running,
            "telemetry"
        );
        Ok(())
    }
}

/// One JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn publish(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Keeps every snapshot in memory.
impl TelemetrySink for Vec<TelemetrySnapshot> {
    fn publish(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        self.push(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionExt;
    use crate::actions::SetSetpoint;
    use crate::config::ControlConfig;
    use gridlock_common::resource::Resource;
    use crate::sim::build_sim_robot;
    use std::time::Duration;

    fn setup() -> (Scheduler<Robot>, Robot) {
        let mut scheduler = Scheduler::new();
        scheduler.register_all(Resource::standard()).unwrap();
        let mut robot = build_sim_robot(&ControlConfig::default());
        robot.set_enabled(true);
        (scheduler, robot)
    }

    #[test]
    fn capture_reflects_running_actions() {
        let (mut scheduler, mut robot) = setup();
        scheduler
            .schedule(SetSetpoint::hold(Setpoint::ScoreMidCone).boxed())
            .unwrap();
        robot.set_time(Duration::from_millis(20));
        robot.sense();
        scheduler.tick(&mut robot);

        let snapshot = TelemetrySnapshot::capture(&scheduler, &robot);
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.time_ms, 20);
        assert!(snapshot.enabled);
        assert_eq!(snapshot.desired_setpoint, Setpoint::ScoreMidCone);
        assert_eq!(
            snapshot.running().collect::<Vec<_>>(),
            vec!["SetSetpoint(ScoreMidCone)"]
        );
    }

    #[test]
    fn json_lines_one_object_per_publish() {
        let (scheduler, robot) = setup();
        let snapshot = TelemetrySnapshot::capture(&scheduler, &robot);
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish(&snapshot).unwrap();
        sink.publish(&snapshot).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["desired_setpoint"], "STOWED");
        assert_eq!(value["zone"], "DISABLED");
    }

    #[test]
    fn memory_sink_collects() {
        let (scheduler, robot) = setup();
        let mut sink: Vec<TelemetrySnapshot> = Vec::new();
        sink.publish(&TelemetrySnapshot::capture(&scheduler, &robot))
            .unwrap();
        assert_eq!(sink.len(), 1);
        assert!(TracingSink.publish(&sink[0]).is_ok());
    }
}
