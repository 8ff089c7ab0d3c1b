//! Exclusive-access resources.
//!
//! A resource is one controllable actuator group (lift, wrist, gripper,
//! drivetrain, ...). Resources are registered once at startup and live for the
//! whole process. Actions declare the resources they need as a `ResourceSet`,
//! a 32-bit mask with one bit per `ResourceId`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::MAX_RESOURCES;

/// Index of a resource inside a `ResourceSet` (0..MAX_RESOURCES).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ResourceId(u8);

impl ResourceId {
    /// Vertical lift (elevator).
    pub const LIFT: Self = Self(0);
    /// Wrist joint.
    pub const WRIST: Self = Self(1);
    /// Gripper / intake rollers.
    pub const GRIPPER: Self = Self(2);
    /// Swerve drivetrain.
    pub const DRIVETRAIN: Self = Self(3);
    /// Field visualization plot.
    pub const FIELD: Self = Self(4);
    /// Vision pipeline selection.
    pub const VISION: Self = Self(5);
    /// Operator status light.
    pub const SIGNAL: Self = Self(6);

    /// Create a resource id, or `None` when `index >= MAX_RESOURCES`.
    #[inline]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_RESOURCES {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Bit index of this resource.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-resource set containing only this id.
    #[inline]
    pub const fn mask(self) -> ResourceSet {
        ResourceSet::from_bits_retain(1u32 << self.0)
    }
}

impl TryFrom<u8> for ResourceId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("resource id {value} >= {MAX_RESOURCES}"))
    }
}

impl From<ResourceId> for u8 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

bitflags! {
    /// Set of resources required by an action.
    ///
    /// Named flags cover the standard GridLock resources; any other registered
    /// id is represented through `ResourceId::mask()`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceSet: u32 {
        const LIFT       = 1 << 0;
        const WRIST      = 1 << 1;
        const GRIPPER    = 1 << 2;
        const DRIVETRAIN = 1 << 3;
        const FIELD      = 1 << 4;
        const VISION     = 1 << 5;
        const SIGNAL     = 1 << 6;

        /// Lift and wrist, the pair driven by a setpoint request.
        const SUPERSTRUCTURE = Self::LIFT.bits() | Self::WRIST.bits();
    }
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ResourceSet {
    /// Iterate the resource ids contained in this set, lowest index first.
    pub fn ids(self) -> impl Iterator<Item = ResourceId> {
        (0..MAX_RESOURCES as u8)
            .filter(move |i| self.bits() & (1u32 << i) != 0)
            .map(ResourceId)
    }

    /// Build a set from resource ids.
    pub fn of(ids: impl IntoIterator<Item = ResourceId>) -> Self {
        ids.into_iter()
            .fold(Self::empty(), |set, id| set.union(id.mask()))
    }
}

/// A registered resource: immutable identity plus a human label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Bit index in `ResourceSet`.
    pub id: ResourceId,
    /// Human-readable label used in logs and telemetry.
    pub label: String,
}

impl Resource {
    /// Create a resource.
    pub fn new(id: ResourceId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// The standard GridLock resource table.
    pub fn standard() -> Vec<Resource> {
        vec![
            Resource::new(ResourceId::LIFT, "lift"),
            Resource::new(ResourceId::WRIST, "wrist"),
            Resource::new(ResourceId::GRIPPER, "gripper"),
            Resource::new(ResourceId::DRIVETRAIN, "drivetrain"),
            Resource::new(ResourceId::FIELD, "field"),
            Resource::new(ResourceId::VISION, "vision"),
            Resource::new(ResourceId::SIGNAL, "signal"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_flags_match_ids() {
        assert_eq!(ResourceId::LIFT.mask(), ResourceSet::LIFT);
        assert_eq!(ResourceId::WRIST.mask(), ResourceSet::WRIST);
        assert_eq!(ResourceId::GRIPPER.mask(), ResourceSet::GRIPPER);
        assert_eq!(ResourceId::DRIVETRAIN.mask(), ResourceSet::DRIVETRAIN);
        assert_eq!(ResourceId::FIELD.mask(), ResourceSet::FIELD);
        assert_eq!(ResourceId::VISION.mask(), ResourceSet::VISION);
        assert_eq!(ResourceId::SIGNAL.mask(), ResourceSet::SIGNAL);
    }

    #[test]
    fn id_range_is_checked() {
        assert!(ResourceId::new(31).is_some());
        assert!(ResourceId::new(32).is_none());
        assert!(ResourceId::try_from(40u8).is_err());
    }

    #[test]
    fn ids_iterates_in_index_order() {
        let set = ResourceSet::GRIPPER | ResourceSet::LIFT | ResourceSet::FIELD;
        let ids: Vec<_> = set.ids().collect();
        assert_eq!(
            ids,
            vec![ResourceId::LIFT, ResourceId::GRIPPER, ResourceId::FIELD]
        );
    }

    #[test]
    fn of_builds_union() {
        let set = ResourceSet::of([ResourceId::LIFT, ResourceId::WRIST]);
        assert_eq!(set, ResourceSet::SUPERSTRUCTURE);
        assert!(ResourceSet::of([]).is_empty());
    }

    #[test]
    fn custom_ids_fit_in_set() {
        let custom = ResourceId::new(20).unwrap();
        let set = ResourceSet::LIFT | custom.mask();
        assert!(set.contains(custom.mask()));
        assert_eq!(set.ids().count(), 2);
    }

    #[test]
    fn standard_table_has_unique_ids() {
        let table = Resource::standard();
        let all = ResourceSet::of(table.iter().map(|r| r.id));
        assert_eq!(all.ids().count(), table.len());
    }
}
