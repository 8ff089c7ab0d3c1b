//! Fixed-period control cycle: sense → tick → actuate → telemetry.
//!
//! ## Clock
//! The runner owns a deterministic clock that advances by exactly one period
//! per cycle, so a replay of the same inputs produces the same schedule. Wall
//! time only paces the loop; it never reaches the actions.
//!
//! ## RT Setup
//! With the `rt` feature the host thread locks its pages, pins itself to a
//! core and switches to `SCHED_FIFO` before entering the loop. Without it every
//! RT call is a no-op and the loop paces itself with `std::thread::sleep`.
//!
//! ## Overruns
//! A cycle body slower than the period is counted and logged. With
//! `cycle.abort_on_overrun` the loop stops with `CycleError::CycleOverrun`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use gridlock_common::config::CycleConfig;

use crate::action::ActionContext;
use crate::robot::Robot;
use crate::scheduler::{Scheduler, SchedulerEvent};
use crate::telemetry::{TelemetryError, TelemetrySink, TelemetrySnapshot};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle body duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (time between expected and actual wake).
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Lock memory, pin to `cpu_core` and switch to `SCHED_FIFO` at
/// `rt_priority`. Call before `CycleRunner::run`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the scheduler, the robot and the telemetry sinks.
pub struct CycleRunner {
    scheduler: Scheduler<Robot>,
    robot: Robot,
    sinks: Vec<Box<dyn TelemetrySink>>,
    period: Duration,
    telemetry_interval: u64,
    abort_on_overrun: bool,
    now: Duration,
    stats: CycleStats,
}

impl CycleRunner {
    pub fn new(scheduler: Scheduler<Robot>, robot: Robot, config: &CycleConfig) -> Self {
        let now = robot.now();
        Self {
            scheduler,
            robot,
            sinks: Vec::new(),
            period: config.period(),
            telemetry_interval: u64::from(config.telemetry_interval.max(1)),
            abort_on_overrun: config.abort_on_overrun,
            now,
            stats: CycleStats::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Deterministic time of the last completed cycle.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &Scheduler<Robot> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<Robot> {
        &mut self.scheduler
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut Robot {
        &mut self.robot
    }

    /// Run one cycle and return the scheduler events it produced.
    pub fn step_once(&mut self) -> Result<Vec<SchedulerEvent>, CycleError> {
        // ═══ SENSE ═══
        self.now += self.period;
        self.robot.set_time(self.now);
        self.robot.sense();

        // ═══ SCHEDULE ═══
        self.scheduler.tick(&mut self.robot);

        // ═══ ACTUATE ═══
        self.robot.actuate(self.period);

        // ═══ TELEMETRY ═══
        if self.scheduler.cycle() % self.telemetry_interval == 0 && !self.sinks.is_empty() {
            let snapshot = TelemetrySnapshot::capture(&self.scheduler, &self.robot);
            for sink in &mut self.sinks {
                sink.publish(&snapshot)?;
            }
        }

        Ok(self.scheduler.drain_events())
    }

    /// Run unpaced until `done` holds after a cycle or `max_cycles` elapse.
    /// Returns the number of cycles run when `done` was met.
    pub fn run_until(
        &mut self,
        max_cycles: u64,
        mut done: impl FnMut(&Scheduler<Robot>, &Robot) -> bool,
    ) -> Result<Option<u64>, CycleError> {
        for cycle in 1..=max_cycles {
            self.step_once()?;
            if done(&self.scheduler, &self.robot) {
                return Ok(Some(cycle));
            }
        }
        Ok(None)
    }

    /// Paced loop until `running` clears or `max_cycles` elapse, then
    /// shut the scheduler down.
    pub fn run(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        info!(
            period_ms = self.period.as_millis() as u64,
            ?max_cycles,
            "entering control loop"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(running, max_cycles);

        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(running, max_cycles);

        self.shutdown();
        info!(
            cycles = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            "control loop stopped"
        );
        result
    }

    /// Stop every running action and leave the robot disabled and idle.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown(&mut self.robot);
        self.robot.set_enabled(false);
        self.robot.actuate(self.period);
    }

    fn keep_going(&self, running: &AtomicBool, max_cycles: Option<u64>) -> bool {
        running.load(Ordering::SeqCst) && max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    /// Count an overrun; fail only when configured to.
    fn check_overrun(&mut self, duration_ns: i64) -> Result<(), CycleError> {
        let budget_ns = self.period.as_nanos() as i64;
        if duration_ns <= budget_ns {
            return Ok(());
        }
        self.stats.overruns += 1;
        warn!(
            cycle = self.scheduler.cycle(),
            actual_ns = duration_ns,
            budget_ns,
            "cycle overrun"
        );
        if self.abort_on_overrun {
            return Err(CycleError::CycleOverrun {
                actual_ns: duration_ns,
                budget_ns,
            });
        }
        Ok(())
    }

    /// RT loop on `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.period.as_nanos() as i64;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.keep_going(running, max_cycles) {
            next_wake = timespec_add_ns(next_wake, period_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            self.step_once()?;
            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, 0);
            self.check_overrun(duration_ns)?;

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            if let Ok(woke) = clock_gettime(clock) {
                let latency = timespec_diff_ns(&woke, &next_wake).abs();
                self.stats.max_latency_ns = self.stats.max_latency_ns.max(latency);
            }
        }
        Ok(())
    }

    /// Host loop paced with `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, running: &AtomicBool, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use std::time::Instant;

        while self.keep_going(running, max_cycles) {
            let cycle_start = Instant::now();
            self.step_once()?;
            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;

            self.stats.record(duration_ns, 0);
            self.check_overrun(duration_ns)?;

            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    TimeSpec::new(
        ts.tv_sec() + total.div_euclid(1_000_000_000),
        total.rem_euclid(1_000_000_000),
    )
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionExt;
    use crate::actions::SetSetpoint;
    use crate::config::ControlConfig;
    use crate::scheduler::InterruptCause;
    use crate::sim::build_sim_robot;
    use gridlock_common::resource::Resource;
    use gridlock_common::superstructure::Setpoint;

    fn runner(config: &CycleConfig) -> CycleRunner {
        let mut scheduler = Scheduler::new();
        scheduler.register_all(Resource::standard()).unwrap();
        let mut robot = build_sim_robot(&ControlConfig::default());
        robot.set_enabled(true);
        CycleRunner::new(scheduler, robot, config)
    }

    #[test]
    fn cycle_stats_basic() {
        let mut stats = CycleStats::new();
        assert_eq!(stats.avg_cycle_ns(), 0);
        stats.record(1000, 10);
        stats.record(3000, 50);
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.min_cycle_ns, 1000);
        assert_eq!(stats.max_cycle_ns, 3000);
        assert_eq!(stats.avg_cycle_ns(), 2000);
        assert_eq!(stats.max_latency_ns, 50);
    }

    #[test]
    fn clock_advances_one_period_per_cycle() {
        let mut runner = runner(&CycleConfig::default());
        for _ in 0..5 {
            runner.step_once().unwrap();
        }
        assert_eq!(runner.now(), Duration::from_millis(100));
        assert_eq!(runner.scheduler().cycle(), 5);
    }

    #[test]
    fn telemetry_follows_interval() {
        let config = CycleConfig {
            telemetry_interval: 5,
            ..CycleConfig::default()
        };
        let snapshots = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        struct Shared(std::rc::Rc<std::cell::RefCell<Vec<TelemetrySnapshot>>>);
        impl TelemetrySink for Shared {
            fn publish(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
                self.0.borrow_mut().push(snapshot.clone());
                Ok(())
            }
        }
        let mut runner = runner(&config).with_sink(Shared(snapshots.clone()));
        for _ in 0..12 {
            runner.step_once().unwrap();
        }
        let cycles: Vec<u64> = snapshots.borrow().iter().map(|s| s.cycle).collect();
        assert_eq!(cycles, vec![5, 10]);
    }

    #[test]
    fn run_until_reports_cycle_count() {
        let mut runner = runner(&CycleConfig::default());
        runner
            .scheduler_mut()
            .schedule(SetSetpoint::until_reached(Setpoint::ScoreMidCone).boxed())
            .unwrap();
        let reached = runner
            .run_until(500, |_, robot| robot.superstructure.is_at_setpoint())
            .unwrap();
        assert!(reached.is_some_and(|n| n > 1 && n < 500));
    }

    #[test]
    fn run_stops_after_max_cycles_and_shuts_down() {
        let mut runner = runner(&CycleConfig {
            period_ms: 5,
            ..CycleConfig::default()
        });
        let id = runner
            .scheduler_mut()
            .schedule(SetSetpoint::hold(Setpoint::ScoreLowCone).boxed())
            .unwrap();
        let running = AtomicBool::new(true);
        runner.run(&running, Some(3)).unwrap();

        assert_eq!(runner.stats().cycle_count, 3);
        assert!(!runner.scheduler().is_running(id));
        assert!(!runner.robot().is_enabled());
        assert!(runner.scheduler().events().iter().any(|e| matches!(
            e,
            SchedulerEvent::Interrupted {
                cause: InterruptCause::Shutdown,
                ..
            }
        )));
    }

    #[test]
    fn cleared_flag_stops_immediately() {
        let mut runner = runner(&CycleConfig::default());
        let running = AtomicBool::new(false);
        runner.run(&running, None).unwrap();
        assert_eq!(runner.stats().cycle_count, 0);
    }
}
