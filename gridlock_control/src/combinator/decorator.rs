//! Single-child decorators: timeout and interrupt-policy override.

use std::time::Duration;

use gridlock_common::resource::ResourceSet;
use tracing::debug;

use super::{Child, CompositionError};
use crate::action::{Action, ActionContext, BoxedAction, InterruptPolicy, Timer};

// ─── Timeout ────────────────────────────────────────────────────────

/// Finishes when the child finishes or `timeout` elapses.
///
/// Timeout wins over non-completion: on expiry the child is stopped with
/// `interrupted = true` and the wrapper itself completes normally, so an
/// enclosing sequence moves on.
pub struct Timeout<C: ActionContext> {
    inner: Child<C>,
    timeout: Duration,
    timer: Timer,
    expired: bool,
}

impl<C: ActionContext> Timeout<C> {
    pub fn new(inner: BoxedAction<C>, timeout: Duration) -> Result<Self, CompositionError> {
        if timeout.is_zero() {
            return Err(CompositionError::ZeroDuration { kind: "Timeout" });
        }
        Ok(Self {
            inner: Child::new(inner),
            timeout,
            timer: Timer::new(),
            expired: false,
        })
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True when the last run ended on the timeout.
    #[inline]
    pub fn expired(&self) -> bool {
        self.expired
    }
}

impl<C: ActionContext> Action<C> for Timeout<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> ResourceSet {
        self.inner.requirements()
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        self.inner.interrupt_policy()
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }

    fn start(&mut self, ctx: &mut C) {
        self.expired = false;
        self.timer.restart(ctx.now());
        self.inner.start(ctx);
    }

    fn step(&mut self, ctx: &mut C) {
        self.inner.step(ctx);
        if self.inner.is_running() && self.timer.has_elapsed(ctx.now(), self.timeout) {
            debug!(
                action = self.inner.name(),
                timeout_ms = self.timeout.as_millis() as u64,
                "timed out"
            );
            self.inner.cancel(ctx);
            self.expired = true;
        }
    }

    fn is_finished(&self, _ctx: &C) -> bool {
        self.expired || self.inner.is_finished()
    }

    fn stop(&mut self, ctx: &mut C, _interrupted: bool) {
        self.inner.cancel(ctx);
        self.timer.stop(ctx.now());
    }
}

// ─── Interrupt Policy Override ──────────────────────────────────────

/// Delegates everything to the wrapped action except `interrupt_policy()`.
pub struct WithInterruptPolicy<C: ActionContext> {
    inner: BoxedAction<C>,
    policy: InterruptPolicy,
}

impl<C: ActionContext> WithInterruptPolicy<C> {
    pub fn new(inner: BoxedAction<C>, policy: InterruptPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<C: ActionContext> Action<C> for WithInterruptPolicy<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn requirements(&self) -> ResourceSet {
        self.inner.requirements()
    }
    fn interrupt_policy(&self) -> InterruptPolicy {
        self.policy
    }
    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
    fn start(&mut self, ctx: &mut C) {
        self.inner.start(ctx)
    }
    fn step(&mut self, ctx: &mut C) {
        self.inner.step(ctx)
    }
    fn is_finished(&self, ctx: &C) -> bool {
        self.inner.is_finished(ctx)
    }
    fn stop(&mut self, ctx: &mut C, interrupted: bool) {
        self.inner.stop(ctx, interrupted)
    }
}
