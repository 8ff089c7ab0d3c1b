//! Scheduler lifecycle events.
//!
//! Every start, finish, interruption and rejected start is recorded as an
//! event and logged. Resource conflicts are a normal scheduling outcome and
//! show up here, never as errors.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Handle to an action registered with a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ActionId(pub(crate) usize);

impl ActionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a running action was stopped with `interrupted = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterruptCause {
    /// Explicit cancel request or falling trigger edge.
    Cancelled,
    /// A newcomer claimed one of its resources.
    Preempted { by: ActionId },
    /// Machine disabled and the action does not run while disabled.
    Disabled,
    /// Scheduler shutdown.
    Shutdown,
}

/// Why a start request was refused this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The holder's policy is `CancelIncoming`.
    HolderKeepsResource,
    /// An earlier candidate in this tick claimed the resource first.
    LostTie,
    /// Machine disabled and the action does not run while disabled.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum SchedulerEvent {
    Started {
        cycle: u64,
        id: ActionId,
        is_default: bool,
    },
    Finished {
        cycle: u64,
        id: ActionId,
    },
    Interrupted {
        cycle: u64,
        id: ActionId,
        cause: InterruptCause,
    },
    Rejected {
        cycle: u64,
        id: ActionId,
        blocked_by: Option<ActionId>,
        reason: RejectReason,
    },
}

impl SchedulerEvent {
    pub fn id(&self) -> ActionId {
        match *self {
            Self::Started { id, .. }
            | Self::Finished { id, .. }
            | Self::Interrupted { id, .. }
            | Self::Rejected { id, .. } => id,
        }
    }

    pub fn cycle(&self) -> u64 {
        match *self {
            Self::Started { cycle, .. }
            | Self::Finished { cycle, .. }
            | Self::Interrupted { cycle, .. }
            | Self::Rejected { cycle, .. } => cycle,
        }
    }

    /// Emit the event through `tracing`. `name` is the action's name.
    pub(crate) fn log(&self, name: &str) {
        match *self {
            Self::Started {
                cycle,
                id,
                is_default,
            } => debug!(cycle, %id, action = name, is_default, "started"),
            Self::Finished { cycle, id } => debug!(cycle, %id, action = name, "finished"),
            Self::Interrupted { cycle, id, cause } => {
                debug!(cycle, %id, action = name, ?cause, "interrupted")
            }
            Self::Rejected {
                cycle,
                id,
                blocked_by,
                reason,
            } => warn!(cycle, %id, action = name, ?blocked_by, ?reason, "start rejected"),
        }
    }
}
