//! Action lifecycle.
//!
//! An action is the atomic unit of schedulable work. It declares the resources
//! it needs up front and is driven through `start` → `step`* → `stop` by its
//! owner (the scheduler or an enclosing combinator). The owner guarantees that
//! `stop` runs exactly once for every `start`, on every exit path.
//!
//! ```text
//!            start()            is_finished() → stop(false)
//!   Idle ───────────────▶ Running ───────────────────────▶ Finished
//!     ▲                      │
//!     └──────────────────────┘
//!        cancel → stop(true)
//! ```

use gridlock_common::resource::ResourceSet;
use serde::Serialize;
use std::time::Duration;

use crate::combinator::{CompositionError, Timeout, WithInterruptPolicy};

pub mod basic;
pub mod timer;

pub use basic::{InstantAction, Wait};
pub use timer::Timer;

// ─── Context ────────────────────────────────────────────────────────

/// State passed to every lifecycle call.
///
/// The context is the only way an action reaches the outside world: the
/// clock, the enable flag and (for the robot context) the actuator owners.
pub trait ActionContext: 'static {
    /// Monotonic time of the current tick.
    fn now(&self) -> Duration;

    /// Machine enable flag. Defaults to always enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

// ─── Policy & State ─────────────────────────────────────────────────

/// What happens when another action claims a resource this action holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InterruptPolicy {
    /// The holder is cancelled and the newcomer proceeds.
    #[default]
    CancelSelf,
    /// The newcomer is rejected for this tick.
    CancelIncoming,
}

/// Lifecycle state tracked by an action's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ActionState {
    /// Not started, or interrupted before completion.
    #[default]
    Idle,
    /// Between `start()` and `stop()`.
    Running,
    /// Reached its own completion predicate.
    Finished,
}

impl ActionState {
    #[inline]
    pub const fn is_running(self) -> bool {
        matches!(self, ActionState::Running)
    }
}

// ─── Action Trait ───────────────────────────────────────────────────

/// A unit of schedulable behaviour.
///
/// `requirements()`, `interrupt_policy()` and `runs_when_disabled()` must not
/// change after construction; owners cache them.
pub trait Action<C: ActionContext> {
    /// Name used in logs, events and telemetry.
    fn name(&self) -> &str;

    /// Resources held exclusively while running.
    fn requirements(&self) -> ResourceSet {
        ResourceSet::empty()
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        InterruptPolicy::CancelSelf
    }

    /// Whether the action keeps running while the machine is disabled.
    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn start(&mut self, _ctx: &mut C) {}

    fn step(&mut self, _ctx: &mut C) {}

    /// Completion predicate, evaluated after `step()`.
    fn is_finished(&self, ctx: &C) -> bool;

    /// Cleanup. `interrupted` is true when the action did not reach its own
    /// completion predicate.
    fn stop(&mut self, _ctx: &mut C, _interrupted: bool) {}
}

/// Owned, type-erased action.
pub type BoxedAction<C> = Box<dyn Action<C>>;

impl<C: ActionContext> Action<C> for BoxedAction<C> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn requirements(&self) -> ResourceSet {
        (**self).requirements()
    }
    fn interrupt_policy(&self) -> InterruptPolicy {
        (**self).interrupt_policy()
    }
    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }
    fn start(&mut self, ctx: &mut C) {
        (**self).start(ctx)
    }
    fn step(&mut self, ctx: &mut C) {
        (**self).step(ctx)
    }
    fn is_finished(&self, ctx: &C) -> bool {
        (**self).is_finished(ctx)
    }
    fn stop(&mut self, ctx: &mut C, interrupted: bool) {
        (**self).stop(ctx, interrupted)
    }
}

// ─── Builder Extensions ─────────────────────────────────────────────

/// Fluent helpers available on every action.
pub trait ActionExt<C: ActionContext>: Action<C> + Sized + 'static {
    /// Erase the concrete type.
    fn boxed(self) -> BoxedAction<C> {
        Box::new(self)
    }

    /// Finish when the action finishes or `timeout` elapses, whichever comes
    /// first. A zero timeout is rejected.
    fn with_timeout(self, timeout: Duration) -> Result<Timeout<C>, CompositionError> {
        Timeout::new(self.boxed(), timeout)
    }

    /// Override the interrupt policy.
    fn with_interrupt_policy(self, policy: InterruptPolicy) -> WithInterruptPolicy<C> {
        WithInterruptPolicy::new(self.boxed(), policy)
    }
}

impl<C: ActionContext, A: Action<C> + 'static> ActionExt<C> for A {}

// ─── Tests ──────────────────────────────────────────────────────────
