//! Concurrent groups: all, race and deadline.
//!
//! Children run together and are stepped in declaration order. Their
//! requirements must be disjoint.

use std::time::Duration;

use gridlock_common::resource::ResourceSet;
use tracing::debug;

use super::{Child, CompositionError, GroupTraits};
use crate::action::{Action, ActionContext, ActionState, BoxedAction, InterruptPolicy, Timer};

fn children_of<C: ActionContext>(actions: Vec<BoxedAction<C>>) -> Vec<Child<C>> {
    actions.into_iter().map(Child::new).collect()
}

fn cancel_running<C: ActionContext>(children: &mut [Child<C>], ctx: &mut C) {
    for child in children.iter_mut() {
        child.cancel(ctx);
    }
}

macro_rules! group_traits_impl {
    () => {
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
    };
}

// ─── Parallel-All ───────────────────────────────────────────────────

/// Runs every child concurrently; finished when all are.
pub struct ParallelAll<C: ActionContext> {
    name: String,
    children: Vec<Child<C>>,
    traits: GroupTraits,
}

impl<C: ActionContext> ParallelAll<C> {
    pub fn new(children: Vec<BoxedAction<C>>) -> Result<Self, CompositionError> {
        let children = children_of(children);
        let traits = GroupTraits::concurrent("ParallelAll", &children)?;
        Ok(Self {
            name: "ParallelAll".to_string(),
            children,
            traits,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<C: ActionContext> Action<C> for ParallelAll<C> {
    group_traits_impl!();

    fn start(&mut self, ctx: &mut C) {
        for child in &mut self.children {
            child.start(ctx);
        }
    }

    fn step(&mut self, ctx: &mut C) {
        for child in &mut self.children {
            child.step(ctx);
        }
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        self.children.iter().all(Child::is_finished)
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        cancel_running(&mut self.children, ctx);
    }
}

// ─── Parallel-Race ──────────────────────────────────────────────────

/// Runs every child concurrently; finished when any child finishes or the
/// optional deadline elapses. Whatever is still running is then cancelled.
///
/// Children are checked before the deadline, so a child completing on the
/// deadline tick wins.
pub struct ParallelRace<C: ActionContext> {
    name: String,
    children: Vec<Child<C>>,
    traits: GroupTraits,
    deadline: Option<Duration>,
    timer: Timer,
    done: bool,
}

impl<C: ActionContext> ParallelRace<C> {
    /// `deadline: None` races the children only.
    pub fn new(
        children: Vec<BoxedAction<C>>,
        deadline: Option<Duration>,
    ) -> Result<Self, CompositionError> {
        if deadline == Some(Duration::ZERO) {
            return Err(CompositionError::ZeroDuration {
                kind: "ParallelRace",
            });
        }
        let children = children_of(children);
        let traits = GroupTraits::concurrent("ParallelRace", &children)?;
        Ok(Self {
            name: "ParallelRace".to_string(),
            children,
            traits,
            deadline,
            timer: Timer::new(),
            done: false,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

impl<C: ActionContext> Action<C> for ParallelRace<C> {
    group_traits_impl!();

    fn start(&mut self, ctx: &mut C) {
        self.done = false;
        self.timer.restart(ctx.now());
        for child in &mut self.children {
            child.start(ctx);
        }
    }

    fn step(&mut self, ctx: &mut C) {
        if self.done {
            return;
        }
        let mut winner = None;
        for (i, child) in self.children.iter_mut().enumerate() {
            if child.step(ctx) == ActionState::Finished && winner.is_none() {
                winner = Some(i);
            }
        }

        if let Some(i) = winner {
            debug!(race = %self.name, winner = self.children[i].name(), "race won");
        } else if let Some(deadline) = self.deadline {
            if !self.timer.has_elapsed(ctx.now(), deadline) {
                return;
            }
            debug!(race = %self.name, deadline_ms = deadline.as_millis() as u64, "race deadline elapsed");
        } else {
            return;
        }

        self.done = true;
        cancel_running(&mut self.children, ctx);
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        self.done
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        cancel_running(&mut self.children, ctx);
        self.timer.stop(ctx.now());
    }
}

// ─── Parallel-Deadline ──────────────────────────────────────────────

/// Runs a leader and followers concurrently; finished when the leader
/// finishes, cancelling any follower still running. Followers that finish
/// early simply stop.
pub struct ParallelDeadline<C: ActionContext> {
    name: String,
    /// `children[0]` is the leader.
    children: Vec<Child<C>>,
    traits: GroupTraits,
}

impl<C: ActionContext> ParallelDeadline<C> {
    pub fn new(
        leader: BoxedAction<C>,
        followers: Vec<BoxedAction<C>>,
    ) -> Result<Self, CompositionError> {
        let mut children = Vec::with_capacity(followers.len() + 1);
        children.push(Child::new(leader));
        children.extend(followers.into_iter().map(Child::new));
        let traits = GroupTraits::concurrent("ParallelDeadline", &children)?;
        Ok(Self {
            name: "ParallelDeadline".to_string(),
            children,
            traits,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn leader(&self) -> &Child<C> {
        &self.children[0]
    }
}

impl<C: ActionContext> Action<C> for ParallelDeadline<C> {
    group_traits_impl!();

    fn start(&mut self, ctx: &mut C) {
        for child in &mut self.children {
            child.start(ctx);
        }
    }

    fn step(&mut self, ctx: &mut C) {
        for child in &mut self.children {
            child.step(ctx);
        }
        if self.leader().is_finished() {
            debug!(group = %self.name, leader = self.leader().name(), "deadline reached");
            cancel_running(&mut self.children, ctx);
        }
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        self.leader().is_finished()
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        cancel_running(&mut self.children, ctx);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
