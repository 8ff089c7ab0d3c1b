//! Tick benchmark: measure one full control cycle and routine assembly.
//!
//! The cycle body (sense, scheduler tick, actuate) has to fit comfortably
//! inside the 20 ms period. These benches track its cost for the teleop
//! configuration, for a running autonomous routine and for wide parallel
//! groups.

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use gridlock_common::auto::AutoTimings;
use gridlock_common::resource::Resource;
use gridlock_control::action::{ActionExt, Wait};
use gridlock_control::auto::AutoSelector;
use gridlock_control::bindings::configure_bindings;
use gridlock_control::combinator::ParallelAll;
use gridlock_control::config::ControlConfig;
use gridlock_control::cycle::CycleRunner;
use gridlock_control::scheduler::Scheduler;
use gridlock_control::sim::{TimedPathFollowerFactory, build_sim_robot, demo_paths};

fn runner() -> CycleRunner {
    let config = ControlConfig::default();
    let mut scheduler = Scheduler::new();
    scheduler.register_all(Resource::standard()).unwrap();
    configure_bindings(&mut scheduler).unwrap();
    let mut robot = build_sim_robot(&config);
    robot.set_enabled(true);
    CycleRunner::new(scheduler, robot, &config.cycle)
}

fn bench_teleop_cycle(c: &mut Criterion) {
    let mut runner = runner();
    c.bench_function("teleop_cycle", |b| {
        b.iter(|| runner.step_once().unwrap());
    });
}

fn bench_autonomous_cycle(c: &mut Criterion) {
    let paths = demo_paths();
    let mut selector = AutoSelector::standard();
    selector.select("SubstationThree").unwrap();

    c.bench_function("substation_three_cycle", |b| {
        b.iter_batched(
            || {
                let mut runner = runner();
                let routine = selector
                    .build(&paths, &TimedPathFollowerFactory, &AutoTimings::default())
                    .unwrap();
                runner.scheduler_mut().schedule(routine).unwrap();
                // Into the first pickup, where the group is widest.
                for _ in 0..250 {
                    runner.step_once().unwrap();
                }
                runner
            },
            |mut runner| runner.step_once().unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_assembly(c: &mut Criterion) {
    let paths = demo_paths();
    let mut selector = AutoSelector::standard();
    selector.select("SubstationThree").unwrap();
    c.bench_function("substation_three_assembly", |b| {
        b.iter(|| {
            selector
                .build(&paths, &TimedPathFollowerFactory, &AutoTimings::default())
                .unwrap()
        });
    });
}

fn bench_parallel_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_all_cycle");
    for width in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            let mut runner = runner();
            let children = (0..width)
                .map(|_| Wait::new(Duration::from_secs(3600)).boxed())
                .collect();
            let all = ParallelAll::new(children).unwrap();
            runner.scheduler_mut().schedule(all.boxed()).unwrap();
            b.iter(|| runner.step_once().unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_teleop_cycle,
    bench_autonomous_cycle,
    bench_assembly,
    bench_parallel_width
);
criterion_main!(benches);
