//! Delayed takeover: hand control from a primary to a secondary action once a
//! delay has elapsed and a condition holds.
//!
//! Used to race a pre-planned path against a sensor-corrected behaviour: the
//! path runs first, and as soon as the vision target is valid (and the robot
//! has been moving for long enough) steering switches to the vision action for
//! the rest of the run. The switch is permanent.

use std::time::Duration;

use gridlock_common::resource::ResourceSet;
use tracing::debug;

use super::{Child, CompositionError, GroupTraits};
use crate::action::{Action, ActionContext, ActionState, BoxedAction, InterruptPolicy, Timer};

/// Side-effect-free switch condition, sampled at most once per step.
pub type Condition<C> = Box<dyn Fn(&C) -> bool>;

pub struct DelayedTakeover<C: ActionContext> {
    name: String,
    primary: Child<C>,
    secondary: Child<C>,
    delay: Duration,
    condition: Condition<C>,
    timer: Timer,
    switched: bool,
    traits: GroupTraits,
}

impl<C: ActionContext> DelayedTakeover<C> {
    /// `delay` may be zero: the condition is then checked from the first step.
    pub fn new(
        primary: BoxedAction<C>,
        secondary: BoxedAction<C>,
        delay: Duration,
        condition: impl Fn(&C) -> bool + 'static,
    ) -> Result<Self, CompositionError> {
        let children = [Child::new(primary), Child::new(secondary)];
        let traits = GroupTraits::sequential("DelayedTakeover", &children)?;
        let [primary, secondary] = children;
        Ok(Self {
            name: "DelayedTakeover".to_string(),
            primary,
            secondary,
            delay,
            condition: Box::new(condition),
            timer: Timer::new(),
            switched: false,
            traits,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether control has passed to the secondary.
    #[inline]
    pub fn has_switched(&self) -> bool {
        self.switched
    }

    fn active(&mut self) -> &mut Child<C> {
        if self.switched {
            &mut self.secondary
        } else {
            &mut self.primary
        }
    }
}

impl<C: ActionContext> Action<C> for DelayedTakeover<C> {
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
        self.switched = false;
        self.timer.restart(ctx.now());
        self.primary.start(ctx);
    }

    fn step(&mut self, ctx: &mut C) {
        if !self.switched
            && self.primary.is_running()
            && self.timer.has_elapsed(ctx.now(), self.delay)
            && (self.condition)(ctx)
        {
            debug!(
                takeover = %self.name,
                from = self.primary.name(),
                to = self.secondary.name(),
                elapsed_ms = self.timer.elapsed(ctx.now()).as_millis() as u64,
                "takeover"
            );
            self.primary.cancel(ctx);
            self.secondary.start(ctx);
            self.switched = true;
        }
        self.active().step(ctx);
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        let active = if self.switched {
            &self.secondary
        } else {
            &self.primary
        };
        active.state() == ActionState::Finished
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        self.active().cancel(ctx);
        self.timer.stop(ctx.now());
    }
}
