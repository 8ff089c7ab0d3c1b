//! Shared fixtures for the integration suites.

mod autonomous;
mod config_file;
mod teleop;
mod timeout;

use gridlock_common::resource::Resource;
use gridlock_control::bindings::{Bindings, configure_bindings};
use gridlock_control::config::ControlConfig;
use gridlock_control::cycle::CycleRunner;
use gridlock_control::scheduler::{ActionId, Scheduler, SchedulerEvent};
use gridlock_control::sim::build_sim_robot;

/// Enabled sim robot with the operator bindings installed.
pub fn bound_runner(config: &ControlConfig) -> (CycleRunner, Bindings) {
    let mut scheduler = Scheduler::new();
    scheduler.register_all(Resource::standard()).unwrap();
    let bindings = configure_bindings(&mut scheduler).unwrap();
    let mut robot = build_sim_robot(config);
    robot.set_enabled(true);
    (CycleRunner::new(scheduler, robot, &config.cycle), bindings)
}

/// Step `cycles` times and collect every event.
pub fn step(runner: &mut CycleRunner, cycles: u32) -> Vec<SchedulerEvent> {
    (0..cycles)
        .flat_map(|_| runner.step_once().unwrap())
        .collect()
}

pub fn finished_at(events: &[SchedulerEvent], id: ActionId) -> Option<u64> {
    events.iter().find_map(|e| match *e {
        SchedulerEvent::Finished { cycle, id: done } if done == id => Some(cycle),
        _ => None,
    })
}
