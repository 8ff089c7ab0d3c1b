//! # GridLock Control
//!
//! Host binary: loads the control configuration, builds the simulated robot,
//! installs the operator bindings and the selected autonomous routine, then
//! runs the fixed-period control loop until Ctrl-C or `--cycles` elapse.

use clap::Parser;
use gridlock_common::config::{ConfigError, LogLevel};
use gridlock_common::resource::Resource;
use gridlock_control::auto::AutoSelector;
use gridlock_control::bindings::configure_bindings;
use gridlock_control::config::{ControlConfig, load_config};
use gridlock_control::cycle::{CycleRunner, rt_setup};
use gridlock_control::scheduler::Scheduler;
use gridlock_control::sim::{TimedPathFollowerFactory, build_sim_robot, demo_paths};
use gridlock_control::telemetry::{JsonLinesSink, TracingSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// GridLock Control: cooperative robot control loop
#[derive(Parser, Debug)]
#[command(name = "gridlock_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Cooperative action scheduler and autonomous routines for a grid-scoring robot")]
struct Args {
    /// Path to the control configuration TOML.
    #[arg(default_value = "config/gridlock.toml")]
    config: PathBuf,

    /// Autonomous option to schedule at startup (default: "Do Nothing").
    #[arg(long, value_name = "NAME")]
    auto: Option<String>,

    /// Print the autonomous options and exit.
    #[arg(long)]
    list_autos: bool,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Write JSON-lines telemetry to this file.
    #[arg(long, value_name = "FILE")]
    telemetry: Option<PathBuf>,

    /// CPU core to pin the control thread to (rt feature only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (rt feature only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Parse the config before the subscriber exists so its log level can
    // serve as the fallback; the outcome is logged right after.
    let loaded = load_config(&args.config);
    let level = match &loaded {
        Ok(config) => config.shared.log_level,
        Err(_) => LogLevel::default(),
    };
    setup_tracing(&args, level);

    info!("GridLock Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) => {
            warn!(
                "Config '{}' not found, using built-in defaults",
                args.config.display()
            );
            ControlConfig::default()
        }
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("GridLock Control shutdown complete");
}

fn run(args: &Args, config: ControlConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut selector = AutoSelector::standard();
    if args.list_autos {
        for option in selector.options() {
            println!("{option}");
        }
        return Ok(());
    }
    if let Some(name) = &args.auto {
        selector.select(name)?;
    }

    // Build the routine before anything runs so a bad selection fails fast.
    let paths = demo_paths();
    let routine = selector.build(&paths, &TimedPathFollowerFactory, &config.auto)?;
    info!(option = selector.selected(), "autonomous routine ready");

    let mut scheduler = Scheduler::new();
    scheduler.register_all(Resource::standard())?;
    let bindings = configure_bindings(&mut scheduler)?;
    info!(
        setpoint_buttons = bindings.setpoints.len(),
        "operator bindings installed"
    );

    let mut robot = build_sim_robot(&config);
    robot.superstructure.zero_all()?;
    robot.set_enabled(true);
    scheduler.schedule(routine)?;

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = CycleRunner::new(scheduler, robot, &config.cycle).with_sink(TracingSink);
    if let Some(path) = &args.telemetry {
        let file = File::create(path)?;
        runner = runner.with_sink(JsonLinesSink::new(BufWriter::new(file)));
        info!(path = %path.display(), "JSON telemetry enabled");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    runner.run(&running, args.cycles)?;
    Ok(())
}

/// Setup tracing subscriber. `RUST_LOG` wins, then `--verbose`, then the
/// configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(configured)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
