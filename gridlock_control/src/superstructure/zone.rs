//! Zone classification.
//!
//! Bands are tested in list order and the first band containing both the lift
//! height and the wrist angle wins. Band bounds are half-open, so a position
//! exactly on a shared boundary belongs to the upper band. When nothing
//! matches the zone falls back to `Enabled` or `Disabled`.

use gridlock_common::superstructure::{Zone, ZoneBand};

/// Classify a lift/wrist position against an ordered band list.
pub fn classify(bands: &[ZoneBand], lift: f64, wrist: f64, enabled: bool) -> Zone {
    bands
        .iter()
        .find(|band| band.matches(lift, wrist))
        .map_or(
            if enabled { Zone::Enabled } else { Zone::Disabled },
            |band| band.zone,
        )
}
