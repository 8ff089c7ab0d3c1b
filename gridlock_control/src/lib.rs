//! # GridLock Control Library
//!
//! Cooperative, fixed-period control core for a multi-actuator robot. A single
//! `Scheduler` owns every running action, advances them once per tick and
//! enforces exclusive access to the robot's resources. Composite actions
//! (sequence, parallel, race, deadline, delayed takeover, timeout) build the
//! autonomous routines, and the superstructure coordinator maps named
//! setpoints onto the lift, wrist and gripper.
//!
//! ## Tick Order
//!
//! 1. Sense: vision refresh, zone classification.
//! 2. `Scheduler::tick`: triggers → cancellations → arbitration → start →
//!    step → retire → defaults.
//! 3. Actuate: the coordinator resolves the desired setpoint into driver
//!    targets with wrist-first settle logic.
//! 4. Telemetry snapshot.
//!
//! ## Threading
//!
//! Single-threaded. Nothing in the core blocks, and every lifecycle call goes
//! through one tick boundary.

pub mod action;
pub mod actions;
pub mod auto;
pub mod bindings;
pub mod combinator;
pub mod config;
pub mod cycle;
pub mod robot;
pub mod scheduler;
pub mod sim;
pub mod superstructure;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testkit;
