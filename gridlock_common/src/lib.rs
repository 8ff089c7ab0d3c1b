//! GridLock Common Library
//!
//! Shared identities, enumerations and configuration structures used by the
//! GridLock control core and its tooling.
//!
//! # Module Structure
//!
//! - [`resource`] - Exclusive-access resource identities and resource sets
//! - [`superstructure`] - Setpoints, gripper states, zones and coordinator config
//! - [`auto`] - Autonomous routine timing budgets
//! - [`config`] - TOML loading trait, shared and cycle configuration
//! - [`consts`] - Workspace-wide limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use gridlock_common::prelude::*;
//!
//! let lift = ResourceId::LIFT;
//! assert!(ResourceSet::SUPERSTRUCTURE.contains(lift.mask()));
//! ```

pub mod auto;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod resource;
pub mod superstructure;
