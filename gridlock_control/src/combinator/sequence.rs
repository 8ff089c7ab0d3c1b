//! Sequential group.

use gridlock_common::resource::ResourceSet;
use tracing::trace;

use super::{Child, CompositionError, GroupTraits};
use crate::action::{Action, ActionContext, ActionState, BoxedAction, InterruptPolicy};

/// Runs children one at a time, in order.
///
/// `start()` starts the first child only. Each `step()` steps the active
/// child; when it finishes it is stopped, and the next child is started (it
/// is first stepped on the following tick). The union of all children's
/// requirements is held for the whole run.
pub struct Sequence<C: ActionContext> {
    name: String,
    children: Vec<Child<C>>,
    index: usize,
    traits: GroupTraits,
}

impl<C: ActionContext> Sequence<C> {
    pub fn new(children: Vec<BoxedAction<C>>) -> Result<Self, CompositionError> {
        let children: Vec<Child<C>> = children.into_iter().map(Child::new).collect();
        let traits = GroupTraits::sequential("Sequence", &children)?;
        Ok(Self {
            name: "Sequence".to_string(),
            index: children.len(),
            children,
            traits,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Index of the active child, `None` when not running.
    pub fn active_index(&self) -> Option<usize> {
        (self.index < self.children.len()).then_some(self.index)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<C: ActionContext> Action<C> for Sequence<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        self.traits.policy
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.when_disabled
    }

    fn start(&mut self, ctx: &mut C) {
        self.index = 0;
        if let Some(first) = self.children.first_mut() {
            first.start(ctx);
        }
    }

    fn step(&mut self, ctx: &mut C) {
        let Some(active) = self.children.get_mut(self.index) else {
            return;
        };
        if active.step(ctx) != ActionState::Finished {
            return;
        }
        self.index += 1;
        if let Some(next) = self.children.get_mut(self.index) {
            trace!(sequence = %self.name, child = next.name(), index = self.index, "advance");
            next.start(ctx);
        }
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        self.index >= self.children.len()
    }

    fn stop(&mut self, ctx: &mut C, interrupted: bool) {
        if interrupted {
            if let Some(active) = self.children.get_mut(self.index) {
                active.cancel(ctx);
            }
        }
    }
}
