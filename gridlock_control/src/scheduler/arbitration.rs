//! Resource ownership and claim arbitration.
//!
//! The table records, per resource, which running action holds it and
//! whether it was claimed during the current tick. A claim is decided against
//! every current holder before anything is cancelled, so a rejected newcomer
//! never disturbs running actions.

use gridlock_common::consts::MAX_RESOURCES;
use gridlock_common::resource::{ResourceId, ResourceSet};
use heapless::Vec as FixedVec;

use super::event::{ActionId, RejectReason};
use crate::action::InterruptPolicy;

/// What the arbiter needs to know about a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderInfo {
    pub policy: InterruptPolicy,
    pub is_default: bool,
}

/// Outcome of a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// Claim granted; these holders must be cancelled first.
    Granted {
        preempt: FixedVec<ActionId, MAX_RESOURCES>,
    },
    /// Claim refused this tick.
    Rejected {
        blocked_by: ActionId,
        reason: RejectReason,
    },
}

/// Per-resource holder table.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    holders: [Option<ActionId>; MAX_RESOURCES],
    /// Resources claimed during the current tick.
    fresh: ResourceSet,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    pub const fn new() -> Self {
        Self {
            holders: [None; MAX_RESOURCES],
            fresh: ResourceSet::empty(),
        }
    }

    /// Current holder of a resource.
    #[inline]
    pub fn holder(&self, resource: ResourceId) -> Option<ActionId> {
        self.holders[resource.index()]
    }

    /// Resources currently held by anyone.
    pub fn held(&self) -> ResourceSet {
        ResourceSet::of(
            (0..MAX_RESOURCES as u8)
                .filter_map(ResourceId::new)
                .filter(|id| self.holders[id.index()].is_some()),
        )
    }

    /// Start a new tick: forget which resources were claimed last tick.
    pub fn begin_tick(&mut self) {
        self.fresh = ResourceSet::empty();
    }

    /// Decide a claim without changing the table.
    ///
    /// Rules, per required resource:
    /// - claimed earlier this tick → rejected, `LostTie`
    /// - held by a non-default `CancelIncoming` action → rejected
    /// - otherwise the holder (default or `CancelSelf`) is preempted
    pub fn arbitrate(
        &self,
        requirements: ResourceSet,
        holder_info: impl Fn(ActionId) -> HolderInfo,
    ) -> ClaimResult {
        let mut preempt = FixedVec::new();
        for resource in requirements.ids() {
            let Some(holder) = self.holder(resource) else {
                continue;
            };
            if self.fresh.contains(resource.mask()) {
                return ClaimResult::Rejected {
                    blocked_by: holder,
                    reason: RejectReason::LostTie,
                };
            }
            let info = holder_info(holder);
            if !info.is_default && info.policy == InterruptPolicy::CancelIncoming {
                return ClaimResult::Rejected {
                    blocked_by: holder,
                    reason: RejectReason::HolderKeepsResource,
                };
            }
            if !preempt.contains(&holder) {
                // At most one distinct holder per resource, so this never overflows.
                let _ = preempt.push(holder);
            }
        }
        ClaimResult::Granted { preempt }
    }

    /// Record `id` as holder of `requirements`, marking them claimed this tick.
    pub fn acquire(&mut self, requirements: ResourceSet, id: ActionId) {
        for resource in requirements.ids() {
            self.holders[resource.index()] = Some(id);
        }
        self.fresh |= requirements;
    }

    /// Release every resource in `requirements` still held by `id`.
    pub fn release(&mut self, requirements: ResourceSet, id: ActionId) {
        for resource in requirements.ids() {
            let slot = &mut self.holders[resource.index()];
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancel_self(_: ActionId) -> HolderInfo {
        HolderInfo {
            policy: InterruptPolicy::CancelSelf,
            is_default: false,
        }
    }

    fn cancel_incoming(_: ActionId) -> HolderInfo {
        HolderInfo {
            policy: InterruptPolicy::CancelIncoming,
            is_default: false,
        }
    }

    #[test]
    fn free_resources_are_granted() {
        let table = ResourceTable::new();
        let result = table.arbitrate(ResourceSet::LIFT, cancel_self);
        assert_eq!(
            result,
            ClaimResult::Granted {
                preempt: FixedVec::new()
            }
        );
    }

    #[test]
    fn cancel_self_holder_is_preempted_once() {
        let mut table = ResourceTable::new();
        table.acquire(ResourceSet::SUPERSTRUCTURE, ActionId(1));
        table.begin_tick();

        match table.arbitrate(ResourceSet::SUPERSTRUCTURE, cancel_self) {
            ClaimResult::Granted { preempt } => assert_eq!(preempt.as_slice(), &[ActionId(1)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cancel_incoming_holder_rejects() {
        let mut table = ResourceTable::new();
        table.acquire(ResourceSet::GRIPPER, ActionId(2));
        table.begin_tick();

        assert_eq!(
            table.arbitrate(ResourceSet::GRIPPER | ResourceSet::LIFT, cancel_incoming),
            ClaimResult::Rejected {
                blocked_by: ActionId(2),
                reason: RejectReason::HolderKeepsResource,
            }
        );
    }

    #[test]
    fn default_holder_always_yields() {
        let mut table = ResourceTable::new();
        table.acquire(ResourceSet::DRIVETRAIN, ActionId(0));
        table.begin_tick();

        let result = table.arbitrate(ResourceSet::DRIVETRAIN, |_| HolderInfo {
            policy: InterruptPolicy::CancelIncoming,
            is_default: true,
        });
        assert!(matches!(result, ClaimResult::Granted { .. }));
    }

    #[test]
    fn same_tick_claim_loses_tie() {
        let mut table = ResourceTable::new();
        table.begin_tick();
        table.acquire(ResourceSet::WRIST, ActionId(5));

        assert_eq!(
            table.arbitrate(ResourceSet::WRIST, cancel_self),
            ClaimResult::Rejected {
                blocked_by: ActionId(5),
                reason: RejectReason::LostTie,
            }
        );

        table.begin_tick();
        assert!(matches!(
            table.arbitrate(ResourceSet::WRIST, cancel_self),
            ClaimResult::Granted { .. }
        ));
    }

    #[test]
    fn release_only_clears_own_entries() {
        let mut table = ResourceTable::new();
        table.acquire(ResourceSet::LIFT, ActionId(1));
        table.acquire(ResourceSet::WRIST, ActionId(2));
        table.release(ResourceSet::SUPERSTRUCTURE, ActionId(1));

        assert_eq!(table.holder(ResourceId::LIFT), None);
        assert_eq!(table.holder(ResourceId::WRIST), Some(ActionId(2)));
        assert_eq!(table.held(), ResourceSet::WRIST);
    }
}
