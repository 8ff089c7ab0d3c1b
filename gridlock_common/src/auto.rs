//! Autonomous routine timing budgets.
//!
//! Every fixed-duration timeout used by the routine library lives here so it
//! can be tuned from `[auto]` without touching the compositions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ConfigError;

/// Timing budgets for autonomous routines [s].
///
/// # TOML Example
///
/// ```toml
/// [auto]
/// score_high_cone = 1.9
/// takeover_delay_first = 1.25
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoTimings {
    /// Reach SCORE_HIGH_CONE.
    #[serde(default = "default_score_high_cone")]
    pub score_high_cone: f64,
    /// Settle before releasing a cone.
    #[serde(default = "default_wait_to_place_cone")]
    pub wait_to_place_cone: f64,
    /// Run the gripper in SCORING_CONE.
    #[serde(default = "default_scoring_cone")]
    pub scoring_cone: f64,
    /// Stow after a high cone.
    #[serde(default = "default_stow_high_cone")]
    pub stow_high_cone: f64,

    /// Reach SCORE_HIGH_CUBE.
    #[serde(default = "default_score_high_cube")]
    pub score_high_cube: f64,
    /// Settle before releasing a cube.
    #[serde(default = "default_wait_to_place_cube")]
    pub wait_to_place_cube: f64,
    /// Run the gripper in SCORING_CUBE.
    #[serde(default = "default_scoring_cube")]
    pub scoring_cube: f64,
    /// Stow after a high cube.
    #[serde(default = "default_stow_high_cube")]
    pub stow_high_cube: f64,

    /// Return from an intake setpoint to STOWED.
    #[serde(default = "default_intake_to_stow")]
    pub intake_to_stow: f64,
    /// Delay before lowering the intake while driving out.
    #[serde(default = "default_intake_delay")]
    pub intake_delay: f64,

    /// Vision takeover delay on the first pickup path.
    #[serde(default = "default_takeover_delay_first")]
    pub takeover_delay_first: f64,
    /// Vision takeover delay on the second pickup path.
    #[serde(default = "default_takeover_delay_second")]
    pub takeover_delay_second: f64,

    /// Time added to the first pickup path when bounding the intake.
    #[serde(default = "default_path_slack_first")]
    pub path_slack_first: f64,
    /// Time added to the second pickup path when bounding the intake.
    #[serde(default = "default_path_slack_second")]
    pub path_slack_second: f64,
}

fn default_score_high_cone() -> f64 {
    1.9
}
fn default_wait_to_place_cone() -> f64 {
    0.2
}
fn default_scoring_cone() -> f64 {
    0.4
}
fn default_stow_high_cone() -> f64 {
    1.2
}
fn default_score_high_cube() -> f64 {
    1.6
}
fn default_wait_to_place_cube() -> f64 {
    0.1
}
fn default_scoring_cube() -> f64 {
    0.3
}
fn default_stow_high_cube() -> f64 {
    1.0
}
fn default_intake_to_stow() -> f64 {
    0.8
}
fn default_intake_delay() -> f64 {
    0.75
}
fn default_takeover_delay_first() -> f64 {
    1.25
}
fn default_takeover_delay_second() -> f64 {
    1.5
}
fn default_path_slack_first() -> f64 {
    1.0
}
fn default_path_slack_second() -> f64 {
    0.95
}

impl Default for AutoTimings {
    fn default() -> Self {
        Self {
            score_high_cone: default_score_high_cone(),
            wait_to_place_cone: default_wait_to_place_cone(),
            scoring_cone: default_scoring_cone(),
            stow_high_cone: default_stow_high_cone(),
            score_high_cube: default_score_high_cube(),
            wait_to_place_cube: default_wait_to_place_cube(),
            scoring_cube: default_scoring_cube(),
            stow_high_cube: default_stow_high_cube(),
            intake_to_stow: default_intake_to_stow(),
            intake_delay: default_intake_delay(),
            takeover_delay_first: default_takeover_delay_first(),
            takeover_delay_second: default_takeover_delay_second(),
            path_slack_first: default_path_slack_first(),
            path_slack_second: default_path_slack_second(),
        }
    }
}

/// Seconds to `Duration`; invalid values collapse to zero and are caught by
/// `validate()` first.
#[inline]
pub fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

impl AutoTimings {
    fn entries(&self) -> [(&'static str, f64); 14] {
        [
            ("score_high_cone", self.score_high_cone),
            ("wait_to_place_cone", self.wait_to_place_cone),
            ("scoring_cone", self.scoring_cone),
            ("stow_high_cone", self.stow_high_cone),
            ("score_high_cube", self.score_high_cube),
            ("wait_to_place_cube", self.wait_to_place_cube),
            ("scoring_cube", self.scoring_cube),
            ("stow_high_cube", self.stow_high_cube),
            ("intake_to_stow", self.intake_to_stow),
            ("intake_delay", self.intake_delay),
            ("takeover_delay_first", self.takeover_delay_first),
            ("takeover_delay_second", self.takeover_delay_second),
            ("path_slack_first", self.path_slack_first),
            ("path_slack_second", self.path_slack_second),
        ]
    }

    /// Every budget must be finite and > 0; slacks may be zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            let is_slack = name.starts_with("path_slack");
            let ok = value.is_finite() && if is_slack { value >= 0.0 } else { value > 0.0 };
            if !ok {
                return Err(ConfigError::ValidationError(format!(
                    "auto.{name} invalid: {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn score_high_cone(&self) -> Duration {
        secs(self.score_high_cone)
    }
    pub fn wait_to_place_cone(&self) -> Duration {
        secs(self.wait_to_place_cone)
    }
    pub fn scoring_cone(&self) -> Duration {
        secs(self.scoring_cone)
    }
    pub fn stow_high_cone(&self) -> Duration {
        secs(self.stow_high_cone)
    }
    pub fn score_high_cube(&self) -> Duration {
        secs(self.score_high_cube)
    }
    pub fn wait_to_place_cube(&self) -> Duration {
        secs(self.wait_to_place_cube)
    }
    pub fn scoring_cube(&self) -> Duration {
        secs(self.scoring_cube)
    }
    pub fn stow_high_cube(&self) -> Duration {
        secs(self.stow_high_cube)
    }
    pub fn intake_to_stow(&self) -> Duration {
        secs(self.intake_to_stow)
    }
    pub fn intake_delay(&self) -> Duration {
        secs(self.intake_delay)
    }
    pub fn takeover_delay_first(&self) -> Duration {
        secs(self.takeover_delay_first)
    }
    pub fn takeover_delay_second(&self) -> Duration {
        secs(self.takeover_delay_second)
    }
    pub fn path_slack_first(&self) -> Duration {
        secs(self.path_slack_first)
    }
    pub fn path_slack_second(&self) -> Duration {
        secs(self.path_slack_second)
    }
}
