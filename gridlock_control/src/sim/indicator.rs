//! Simulated status light.

use gridlock_common::superstructure::Zone;
use tracing::debug;

use crate::robot::{SignalColor, StatusIndicator};

/// Status light that records what it shows.
#[derive(Debug, Clone, Default)]
pub struct SimIndicator {
    zone: Option<Zone>,
    changes: u32,
}

impl SimIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the shown zone changed.
    pub fn changes(&self) -> u32 {
        self.changes
    }
}

impl StatusIndicator for SimIndicator {
    fn show(&mut self, zone: Zone) {
        if self.zone == Some(zone) {
            return;
        }
        debug!(?zone, color = ?SignalColor::for_zone(zone), "status light");
        self.zone = Some(zone);
        self.changes += 1;
    }

    fn shown(&self) -> Option<Zone> {
        self.zone
    }
}
