//! System-wide constants for the GridLock workspace.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Maximum number of registrable resources (one bit each in a `ResourceSet`).
pub const MAX_RESOURCES: usize = 32;

/// Maximum number of zone bands in the classification priority list.
pub const MAX_ZONE_BANDS: usize = 8;

/// Scheduler events kept between drains. Older events are discarded first.
pub const EVENT_LOG_CAPACITY: usize = 1024;

/// Default control period in milliseconds (50 Hz).
pub const CYCLE_PERIOD_MS: u64 = 20;

/// Lower bound for the configurable control period [ms].
pub const CYCLE_PERIOD_MS_MIN: u64 = 1;

/// Upper bound for the configurable control period [ms].
pub const CYCLE_PERIOD_MS_MAX: u64 = 1000;

/// Length of the autonomous period of a match [s].
pub const AUTONOMOUS_DURATION_S: f64 = 15.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/gridlock.toml";

const_assert!(MAX_RESOURCES <= u32::BITS as usize);
const_assert!(EVENT_LOG_CAPACITY >= 2);
const_assert!(CYCLE_PERIOD_MS_MIN <= CYCLE_PERIOD_MS && CYCLE_PERIOD_MS <= CYCLE_PERIOD_MS_MAX);
