//! Control configuration bundle.
//!
//! One TOML file carries every section; each section has defaults so an
//! empty file is a valid configuration. `load_config` parses and validates
//! in one step.
//!
//! ```toml
//! [shared]
//! service_name = "gridlock-sim"
//!
//! [cycle]
//! period_ms = 20
//!
//! [superstructure]
//! wrist_travel_angle = 30.0
//!
//! [auto]
//! score_high_cone = 1.9
//!
//! [sim]
//! lift_velocity = 1.5
//! ```

use std::path::Path;
use std::time::Duration;

use gridlock_common::auto::{AutoTimings, secs};
use gridlock_common::config::{ConfigError, ConfigLoader, CycleConfig, SharedConfig};
use gridlock_common::superstructure::SuperstructureConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

// ─── Simulation ─────────────────────────────────────────────────────

/// Simulated collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Lift slew rate [m/s]. `inf` snaps to target.
    #[serde(default = "default_lift_velocity")]
    pub lift_velocity: f64,

    /// Wrist slew rate [deg/s]. `inf` snaps to target.
    #[serde(default = "default_wrist_velocity")]
    pub wrist_velocity: f64,

    /// Time a game-piece pipeline needs before it reports a target [s].
    #[serde(default = "default_vision_acquire_delay")]
    pub vision_acquire_delay: f64,

    /// Whether a game piece is in view at all.
    #[serde(default = "default_true")]
    pub vision_target_present: bool,

    /// Horizontal angle of the simulated game piece [deg].
    #[serde(default = "default_vision_target_offset")]
    pub vision_target_offset: f64,
}

fn default_lift_velocity() -> f64 {
    1.5
}
fn default_wrist_velocity() -> f64 {
    360.0
}
fn default_vision_acquire_delay() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_vision_target_offset() -> f64 {
    4.0
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lift_velocity: default_lift_velocity(),
            wrist_velocity: default_wrist_velocity(),
            vision_acquire_delay: default_vision_acquire_delay(),
            vision_target_present: true,
            vision_target_offset: default_vision_target_offset(),
        }
    }
}

impl SimConfig {
    pub fn vision_acquire_delay(&self) -> Duration {
        secs(self.vision_acquire_delay)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lift_velocity", self.lift_velocity),
            ("wrist_velocity", self.wrist_velocity),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "sim.{name} must be > 0 (got {value})"
                )));
            }
        }
        if !self.vision_acquire_delay.is_finite() || self.vision_acquire_delay < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "sim.vision_acquire_delay must be finite and >= 0 (got {})",
                self.vision_acquire_delay
            )));
        }
        if !self.vision_target_offset.is_finite() {
            return Err(ConfigError::ValidationError(
                "sim.vision_target_offset must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Bundle ─────────────────────────────────────────────────────────

/// Complete control configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub superstructure: SuperstructureConfig,
    #[serde(default)]
    pub auto: AutoTimings,
    #[serde(default)]
    pub sim: SimConfig,
}

impl ControlConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.cycle.validate()?;
        self.superstructure.validate()?;
        self.auto.validate()?;
        self.sim.validate()
    }
}

/// Load and validate the control configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::load(path)?;
    config.validate()?;
    info!(
        path = %path.display(),
        service = %config.shared.service_name,
        period_ms = config.cycle.period_ms,
        zones = config.superstructure.zones.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Parse and validate from an in-memory string (tests, embedded defaults).
pub fn load_config_from_str(content: &str) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_common::superstructure::Setpoint;

    #[test]
    fn empty_string_is_default() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.cycle.period_ms, 20);
        assert_eq!(config.sim.lift_velocity, 1.5);
        assert_eq!(config.shared.service_name, "gridlock");
    }

    #[test]
    fn sections_override_defaults() {
        let config = load_config_from_str(
            r#"
[cycle]
period_ms = 10

[superstructure.setpoints]
STOWED = { lift = 0.01, wrist = 0.0 }

[sim]
lift_velocity = inf
vision_target_present = false
"#,
        )
        .unwrap();
        assert_eq!(config.cycle.period_ms, 10);
        assert_eq!(config.superstructure.targets(Setpoint::Stowed).lift, 0.01);
        assert!(config.sim.lift_velocity.is_infinite());
        assert!(!config.sim.vision_target_present);
    }

    #[test]
    fn unknown_section_rejected() {
        assert!(matches!(
            load_config_from_str("[bogus]\nx = 1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn sim_bounds_checked() {
        assert!(matches!(
            load_config_from_str("[sim]\nwrist_velocity = 0.0"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            load_config_from_str("[sim]\nvision_acquire_delay = -1.0"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_file_reported() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/gridlock.toml")),
            Err(ConfigError::FileNotFound)
        ));
    }
}
