//! Composite actions.
//!
//! Every combinator is itself an `Action` that owns an indexed collection of
//! children and drives their lifecycle with the same guarantees the scheduler
//! gives top-level actions: `stop` exactly once per `start`, cancellation only
//! between steps, children stepped in declaration order.
//!
//! | Combinator        | Finishes when                              | Requirements   |
//! |-------------------|--------------------------------------------|----------------|
//! | `Sequence`        | last child finishes                        | union          |
//! | `ParallelAll`     | every child finished                       | disjoint union |
//! | `ParallelRace`    | any child finishes or the deadline elapses | disjoint union |
//! | `ParallelDeadline`| the leader finishes                        | disjoint union |
//! | `DelayedTakeover` | the active child finishes                  | union          |
//! | `Timeout`         | the child finishes or the timeout elapses  | child's        |
//!
//! Malformed compositions (empty groups, zero deadlines, parallel children
//! sharing a resource) are rejected at construction.

use gridlock_common::resource::ResourceSet;
use thiserror::Error;

use crate::action::{ActionContext, InterruptPolicy};

mod child;
pub mod decorator;
pub mod parallel;
pub mod sequence;
pub mod takeover;

pub(crate) use child::Child;
pub use decorator::{Timeout, WithInterruptPolicy};
pub use parallel::{ParallelAll, ParallelDeadline, ParallelRace};
pub use sequence::Sequence;
pub use takeover::DelayedTakeover;

/// Construction-time composition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// Group built without children.
    #[error("{kind} has no children")]
    Empty {
        /// Combinator kind.
        kind: &'static str,
    },

    /// Deadline or timeout of zero.
    #[error("{kind} duration must be non-zero")]
    ZeroDuration {
        /// Combinator kind.
        kind: &'static str,
    },

    /// Two concurrently running children require the same resource.
    #[error("{kind} children overlap on resources {overlap:?}")]
    OverlappingRequirements {
        /// Combinator kind.
        kind: &'static str,
        /// Resources required by more than one child.
        overlap: ResourceSet,
    },
}

// ─── Group Properties ───────────────────────────────────────────────

/// Requirements, interrupt policy and disabled behaviour shared by every
/// group, computed once at construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GroupTraits {
    pub requirements: ResourceSet,
    pub policy: InterruptPolicy,
    pub when_disabled: bool,
}

impl GroupTraits {
    /// Sequential groups: children never run together, requirements may
    /// overlap.
    pub fn sequential<C: ActionContext>(
        kind: &'static str,
        children: &[Child<C>],
    ) -> Result<Self, CompositionError> {
        if children.is_empty() {
            return Err(CompositionError::Empty { kind });
        }
        let requirements = children
            .iter()
            .fold(ResourceSet::empty(), |acc, c| acc | c.requirements());
        Ok(Self::with_requirements(children, requirements))
    }

    /// Concurrent groups: children run together and must not share a
    /// resource.
    pub fn concurrent<C: ActionContext>(
        kind: &'static str,
        children: &[Child<C>],
    ) -> Result<Self, CompositionError> {
        if children.is_empty() {
            return Err(CompositionError::Empty { kind });
        }
        let mut requirements = ResourceSet::empty();
        for child in children {
            let overlap = requirements & child.requirements();
            if !overlap.is_empty() {
                return Err(CompositionError::OverlappingRequirements { kind, overlap });
            }
            requirements |= child.requirements();
        }
        Ok(Self::with_requirements(children, requirements))
    }

    /// A group refuses incoming claims only when every child does, and runs
    /// while disabled only when every child does.
    fn with_requirements<C: ActionContext>(
        children: &[Child<C>],
        requirements: ResourceSet,
    ) -> Self {
        let policy = if children
            .iter()
            .all(|c| c.interrupt_policy() == InterruptPolicy::CancelIncoming)
        {
            InterruptPolicy::CancelIncoming
        } else {
            InterruptPolicy::CancelSelf
        };
        Self {
            requirements,
            policy,
            when_disabled: children.iter().all(|c| c.runs_when_disabled()),
        }
    }
}
