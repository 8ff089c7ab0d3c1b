//! Context-agnostic leaf actions.

use std::time::Duration;

use gridlock_common::resource::ResourceSet;

use super::{Action, ActionContext, Timer};

/// Finishes once `duration` has elapsed since start.
///
/// A zero duration finishes on its first step.
#[derive(Debug, Clone)]
pub struct Wait {
    duration: Duration,
    timer: Timer,
}

impl Wait {
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            timer: Timer::new(),
        }
    }

    #[inline]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl<C: ActionContext> Action<C> for Wait {
    fn name(&self) -> &str {
        "Wait"
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut C) {
        self.timer.restart(ctx.now());
    }

    fn is_finished(&self, ctx: &C) -> bool {
        self.timer.has_elapsed(ctx.now(), self.duration)
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        self.timer.stop(ctx.now());
    }
}

/// Runs a closure once on start and finishes on its first step.
pub struct InstantAction<C: ActionContext> {
    name: String,
    run: Box<dyn FnMut(&mut C)>,
    requirements: ResourceSet,
    when_disabled: bool,
}

impl<C: ActionContext> InstantAction<C> {
    pub fn new(name: impl Into<String>, run: impl FnMut(&mut C) + 'static) -> Self {
        Self {
            name: name.into(),
            run: Box::new(run),
            requirements: ResourceSet::empty(),
            when_disabled: false,
        }
    }

    /// No-op placeholder.
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, |_| {})
    }

    pub fn requiring(mut self, requirements: ResourceSet) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn when_disabled(mut self) -> Self {
        self.when_disabled = true;
        self
    }
}

impl<C: ActionContext> Action<C> for InstantAction<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn runs_when_disabled(&self) -> bool {
        self.when_disabled
    }

    fn start(&mut self, ctx: &mut C) {
        (self.run)(ctx);
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        true
    }
}
