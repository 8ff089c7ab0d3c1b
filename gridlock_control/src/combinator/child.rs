//! Lifecycle guard around a combinator child.

use gridlock_common::resource::ResourceSet;

use crate::action::{Action, ActionContext, ActionState, BoxedAction, InterruptPolicy};

/// A child action plus the state its parent tracks for it.
///
/// All transitions go through `start`, `step` and `cancel`, which is what
/// makes `stop` exactly-once: `stop(false)` is only issued from `step` on the
/// Running → Finished edge, `stop(true)` only from `cancel` on Running → Idle.
pub(crate) struct Child<C: ActionContext> {
    action: BoxedAction<C>,
    state: ActionState,
}

impl<C: ActionContext> Child<C> {
    pub fn new(action: BoxedAction<C>) -> Self {
        Self {
            action,
            state: ActionState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> ActionState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == ActionState::Finished
    }

    pub fn name(&self) -> &str {
        self.action.name()
    }

    pub fn requirements(&self) -> ResourceSet {
        self.action.requirements()
    }

    pub fn interrupt_policy(&self) -> InterruptPolicy {
        self.action.interrupt_policy()
    }

    pub fn runs_when_disabled(&self) -> bool {
        self.action.runs_when_disabled()
    }

    /// Start (or restart) the child.
    pub fn start(&mut self, ctx: &mut C) {
        if self.state.is_running() {
            // Restarting a running child would skip its stop().
            self.action.stop(ctx, true);
        }
        self.action.start(ctx);
        self.state = ActionState::Running;
    }

    /// Step a running child and retire it if its completion predicate holds.
    /// Returns the state after the step.
    pub fn step(&mut self, ctx: &mut C) -> ActionState {
        if self.state.is_running() {
            self.action.step(ctx);
            if self.action.is_finished(ctx) {
                self.action.stop(ctx, false);
                self.state = ActionState::Finished;
            }
        }
        self.state
    }

    /// Interrupt a running child. No-op otherwise.
    pub fn cancel(&mut self, ctx: &mut C) {
        if self.state.is_running() {
            self.action.stop(ctx, true);
            self.state = ActionState::Idle;
        }
    }
}
