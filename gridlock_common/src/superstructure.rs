//! Superstructure types: setpoints, gripper states, zones and the coordinator
//! configuration.
//!
//! A `Setpoint` is a symbolic target resolved into a lift height [m] and a
//! wrist angle [deg]. A `Zone` classifies the *current* lift/wrist position
//! through an ordered list of `ZoneBand`s where the first match wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::config::ConfigError;
use crate::consts::MAX_ZONE_BANDS;

// ─── Setpoints ──────────────────────────────────────────────────────

/// Named superstructure target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Setpoint {
    Stowed,
    IntakingLowCube,
    IntakingLowCone,
    IntakingExtendedCone,
    ScoreLowReverse,
    ScoreLowCone,
    ScoreLowCube,
    ScoreMidCone,
    ScoreMidCube,
    ScoreHighCone,
    ScoreHighCube,
}

impl Setpoint {
    /// Every setpoint, in declaration order.
    pub const ALL: [Setpoint; 11] = [
        Setpoint::Stowed,
        Setpoint::IntakingLowCube,
        Setpoint::IntakingLowCone,
        Setpoint::IntakingExtendedCone,
        Setpoint::ScoreLowReverse,
        Setpoint::ScoreLowCone,
        Setpoint::ScoreLowCube,
        Setpoint::ScoreMidCone,
        Setpoint::ScoreMidCube,
        Setpoint::ScoreHighCone,
        Setpoint::ScoreHighCube,
    ];

    /// Built-in targets, used unless overridden in `[superstructure.setpoints]`.
    pub const fn default_targets(self) -> SetpointTargets {
        let (lift, wrist) = match self {
            Setpoint::Stowed => (0.0, 5.0),
            Setpoint::IntakingLowCube => (0.08, 165.0),
            Setpoint::IntakingLowCone => (0.10, 155.0),
            Setpoint::IntakingExtendedCone => (1.00, 120.0),
            Setpoint::ScoreLowReverse => (0.0, 60.0),
            Setpoint::ScoreLowCone => (0.15, 100.0),
            Setpoint::ScoreLowCube => (0.15, 95.0),
            Setpoint::ScoreMidCone => (0.55, 140.0),
            Setpoint::ScoreMidCube => (0.45, 130.0),
            Setpoint::ScoreHighCone => (0.95, 150.0),
            Setpoint::ScoreHighCube => (0.85, 140.0),
        };
        SetpointTargets { lift, wrist }
    }
}

/// Concrete per-actuator targets of a setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetpointTargets {
    /// Lift height [m].
    pub lift: f64,
    /// Wrist angle [deg].
    pub wrist: f64,
}

// ─── Gripper ────────────────────────────────────────────────────────

/// Gripper roller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GripperState {
    #[default]
    None,
    IntakingCone,
    IntakingCube,
    HoldingCone,
    HoldingCube,
    ScoringCone,
    ScoringCube,
}

impl GripperState {
    /// Built-in roller output [-1.0, 1.0].
    pub const fn default_output(self) -> f64 {
        match self {
            GripperState::None => 0.0,
            GripperState::IntakingCone => 0.8,
            GripperState::IntakingCube => -0.7,
            GripperState::HoldingCone => 0.1,
            GripperState::HoldingCube => -0.1,
            GripperState::ScoringCone => -0.8,
            GripperState::ScoringCube => 0.7,
        }
    }
}

// ─── Zones ──────────────────────────────────────────────────────────

/// Signaling zone derived from the current lift/wrist position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Low,
    Mid,
    High,
    Extended,
    /// Fallback: no band matched, machine enabled.
    Enabled,
    /// Fallback: no band matched, machine disabled.
    Disabled,
}

impl Zone {
    /// Fallback zones come from the enable flag, never from a band.
    #[inline]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Zone::Enabled | Zone::Disabled)
    }
}

/// Half-open interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Lower bound inclusive, upper bound exclusive.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

impl From<[f64; 2]> for Band {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<Band> for [f64; 2] {
    fn from(band: Band) -> Self {
        [band.min, band.max]
    }
}

/// One entry of the zone priority list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneBand {
    pub zone: Zone,
    /// Lift height band [m].
    pub lift: Band,
    /// Wrist angle band [deg].
    pub wrist: Band,
}

impl ZoneBand {
    #[inline]
    pub fn matches(&self, lift: f64, wrist: f64) -> bool {
        self.lift.contains(lift) && self.wrist.contains(wrist)
    }
}

/// Default priority list: low → mid → high → extended.
pub const DEFAULT_ZONE_BANDS: [ZoneBand; 4] = [
    ZoneBand {
        zone: Zone::Low,
        lift: Band::new(0.05, 0.35),
        wrist: Band::new(-10.0, 200.0),
    },
    ZoneBand {
        zone: Zone::Mid,
        lift: Band::new(0.35, 0.75),
        wrist: Band::new(-10.0, 200.0),
    },
    ZoneBand {
        zone: Zone::High,
        lift: Band::new(0.75, 1.30),
        wrist: Band::new(-10.0, 135.0),
    },
    ZoneBand {
        zone: Zone::Extended,
        lift: Band::new(0.75, 1.30),
        wrist: Band::new(135.0, 200.0),
    },
];

const_assert!(DEFAULT_ZONE_BANDS.len() <= MAX_ZONE_BANDS);

/// Fixed-capacity zone priority list.
pub type ZoneBands = heapless::Vec<ZoneBand, MAX_ZONE_BANDS>;

fn default_zone_bands() -> ZoneBands {
    let mut bands = ZoneBands::new();
    for band in DEFAULT_ZONE_BANDS {
        // Capacity is checked at compile time above.
        let _ = bands.push(band);
    }
    bands
}

// ─── Coordinator Config ─────────────────────────────────────────────

/// Superstructure coordinator configuration.
///
/// # TOML Example
///
/// ```toml
/// [superstructure]
/// lift_tolerance = 0.02
/// wrist_tolerance = 2.0
/// wrist_travel_angle = 30.0
///
/// zones = [
///     { zone = "LOW", lift = [0.05, 0.35], wrist = [-10.0, 200.0] },
///     { zone = "MID", lift = [0.35, 0.75], wrist = [-10.0, 200.0] },
/// ]
///
/// [superstructure.setpoints]
/// SCORE_HIGH_CONE = { lift = 0.97, wrist = 152.0 }
///
/// [superstructure.gripper]
/// SCORING_CONE = -0.9
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperstructureConfig {
    /// Lift in-position band [m].
    #[serde(default = "default_lift_tolerance")]
    pub lift_tolerance: f64,

    /// Wrist in-position band [deg].
    #[serde(default = "default_wrist_tolerance")]
    pub wrist_tolerance: f64,

    /// Lift error above which the wrist is parked at `wrist_travel_angle` [m].
    #[serde(default = "default_lift_travel_threshold")]
    pub lift_travel_threshold: f64,

    /// Wrist angle held while the lift travels [deg]. `None` disables parking.
    #[serde(default = "default_wrist_travel_angle")]
    pub wrist_travel_angle: Option<f64>,

    /// Zone priority list, first match wins.
    #[serde(default = "default_zone_bands")]
    pub zones: ZoneBands,

    /// Setpoint target overrides.
    #[serde(default)]
    pub setpoints: BTreeMap<Setpoint, SetpointTargets>,

    /// Gripper output overrides.
    #[serde(default)]
    pub gripper: BTreeMap<GripperState, f64>,
}

fn default_lift_tolerance() -> f64 {
    0.02
}
fn default_wrist_tolerance() -> f64 {
    2.0
}
fn default_lift_travel_threshold() -> f64 {
    0.15
}
fn default_wrist_travel_angle() -> Option<f64> {
    Some(30.0)
}

impl Default for SuperstructureConfig {
    fn default() -> Self {
        Self {
            lift_tolerance: default_lift_tolerance(),
            wrist_tolerance: default_wrist_tolerance(),
            lift_travel_threshold: default_lift_travel_threshold(),
            wrist_travel_angle: default_wrist_travel_angle(),
            zones: default_zone_bands(),
            setpoints: BTreeMap::new(),
            gripper: BTreeMap::new(),
        }
    }
}

impl SuperstructureConfig {
    /// Resolved targets for a setpoint (override or built-in).
    pub fn targets(&self, setpoint: Setpoint) -> SetpointTargets {
        self.setpoints
            .get(&setpoint)
            .copied()
            .unwrap_or_else(|| setpoint.default_targets())
    }

    /// Resolved roller output for a gripper state (override or built-in).
    pub fn gripper_output(&self, state: GripperState) -> f64 {
        self.gripper
            .get(&state)
            .copied()
            .unwrap_or_else(|| state.default_output())
    }

    /// Validate tolerances, bands and overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("lift_tolerance", self.lift_tolerance),
            ("wrist_tolerance", self.wrist_tolerance),
            ("lift_travel_threshold", self.lift_travel_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "superstructure.{name} must be finite and > 0 (got {value})"
                )));
            }
        }
        if let Some(angle) = self.wrist_travel_angle {
            if !angle.is_finite() {
                return Err(ConfigError::ValidationError(
                    "superstructure.wrist_travel_angle must be finite".to_string(),
                ));
            }
        }

        for (i, band) in self.zones.iter().enumerate() {
            if band.zone.is_fallback() {
                return Err(ConfigError::ValidationError(format!(
                    "zones[{i}]: {:?} is a fallback zone and cannot have a band",
                    band.zone
                )));
            }
            for (axis, b) in [("lift", band.lift), ("wrist", band.wrist)] {
                if !(b.min.is_finite() && b.max.is_finite()) || b.min >= b.max {
                    return Err(ConfigError::ValidationError(format!(
                        "zones[{i}].{axis}: band [{}, {}) is empty or not finite",
                        b.min, b.max
                    )));
                }
            }
        }

        for (setpoint, targets) in &self.setpoints {
            if !(targets.lift.is_finite() && targets.wrist.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "setpoints.{setpoint:?}: targets must be finite"
                )));
            }
        }
        for (state, output) in &self.gripper {
            if !output.is_finite() || output.abs() > 1.0 {
                return Err(ConfigError::ValidationError(format!(
                    "gripper.{state:?}: output {output} outside [-1.0, 1.0]"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_is_half_open() {
        let band = Band::new(2.0, 5.0);
        assert!(band.contains(2.0));
        assert!(band.contains(4.999));
        assert!(!band.contains(5.0));
        assert!(!band.contains(1.999));
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = SuperstructureConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.zones.len(), 4);
        assert_eq!(cfg.zones[0].zone, Zone::Low);
        assert_eq!(cfg.zones[3].zone, Zone::Extended);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut cfg = SuperstructureConfig::default();
        cfg.setpoints.insert(
            Setpoint::ScoreHighCone,
            SetpointTargets {
                lift: 1.1,
                wrist: 155.0,
            },
        );
        cfg.gripper.insert(GripperState::ScoringCone, -1.0);

        assert_eq!(cfg.targets(Setpoint::ScoreHighCone).lift, 1.1);
        assert_eq!(
            cfg.targets(Setpoint::Stowed),
            Setpoint::Stowed.default_targets()
        );
        assert_eq!(cfg.gripper_output(GripperState::ScoringCone), -1.0);
        assert_eq!(cfg.gripper_output(GripperState::None), 0.0);
    }

    #[test]
    fn fallback_zone_band_rejected() {
        let mut cfg = SuperstructureConfig::default();
        cfg.zones[0].zone = Zone::Enabled;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_band_rejected() {
        let mut cfg = SuperstructureConfig::default();
        cfg.zones[1].lift = Band::new(0.5, 0.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn gripper_output_range_checked() {
        let mut cfg = SuperstructureConfig::default();
        cfg.gripper.insert(GripperState::IntakingCube, 1.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zone_list_parses_from_toml() {
        let cfg: SuperstructureConfig = toml::from_str(
            r#"
zones = [
    { zone = "LOW", lift = [0.0, 2.0], wrist = [-180.0, 180.0] },
    { zone = "MID", lift = [2.0, 5.0], wrist = [-180.0, 180.0] },
]

[setpoints]
STOWED = { lift = 0.01, wrist = 0.0 }
"#,
        )
        .unwrap();
        assert_eq!(cfg.zones.len(), 2);
        assert_eq!(cfg.zones[1].zone, Zone::Mid);
        assert_eq!(cfg.zones[1].lift, Band::new(2.0, 5.0));
        assert_eq!(cfg.targets(Setpoint::Stowed).lift, 0.01);
        assert_eq!(cfg.lift_tolerance, 0.02);
    }

    #[test]
    fn every_setpoint_has_finite_defaults() {
        for s in Setpoint::ALL {
            let t = s.default_targets();
            assert!(t.lift.is_finite() && t.wrist.is_finite(), "{s:?}");
        }
    }
}
