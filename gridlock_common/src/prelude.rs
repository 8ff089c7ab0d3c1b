//! Prelude module for common re-exports.
//!
//! ```rust
//! use gridlock_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::auto::AutoTimings;
pub use crate::config::{ConfigError, ConfigLoader, CycleConfig, LogLevel, SharedConfig};
pub use crate::superstructure::SuperstructureConfig;

// ─── Identities ─────────────────────────────────────────────────────
pub use crate::resource::{Resource, ResourceId, ResourceSet};
pub use crate::superstructure::{
    Band, GripperState, Setpoint, SetpointTargets, Zone, ZoneBand, ZoneBands,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_PERIOD_MS, MAX_RESOURCES, MAX_ZONE_BANDS};

/// Default control period as Duration.
pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_millis(CYCLE_PERIOD_MS);
