//! Integration test: the shipped configuration file.

use std::fs;

use gridlock_common::config::{ConfigError, LogLevel};
use gridlock_common::superstructure::{GripperState, Zone};
use gridlock_control::config::{load_config, load_config_from_str};
use tempfile::TempDir;

const SHIPPED: &str = include_str!("../../config/gridlock.toml");

#[test]
fn shipped_config_is_valid() {
    let config = load_config_from_str(SHIPPED).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Info);
    assert_eq!(config.cycle.period_ms, 20);
    assert_eq!(config.superstructure.zones.len(), 4);
    assert_eq!(config.superstructure.zones[3].zone, Zone::Extended);
    assert_eq!(
        config.superstructure.gripper_output(GripperState::IntakingCube),
        -0.7
    );
    assert_eq!(config.auto.takeover_delay_second, 1.5);
}

#[test]
fn load_from_disk_and_reject_bad_values() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("gridlock.toml");
    fs::write(&good, SHIPPED).unwrap();
    assert!(load_config(&good).is_ok());

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, SHIPPED.replace("period_ms = 20", "period_ms = 0")).unwrap();
    assert!(matches!(
        load_config(&bad),
        Err(ConfigError::ValidationError(_))
    ));

    assert!(matches!(
        load_config(&dir.path().join("missing.toml")),
        Err(ConfigError::FileNotFound)
    ));
}
