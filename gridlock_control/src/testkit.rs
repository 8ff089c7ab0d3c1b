//! Unit-test helpers: a manually clocked context and a recording action.
//!
//! Time is expressed in whole ticks of one second, so `advance_to(5)` means
//! `now == 5 s`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gridlock_common::resource::ResourceSet;

use crate::action::{Action, ActionContext, InterruptPolicy};

pub(crate) struct TestContext {
    pub now: Duration,
    pub enabled: bool,
    pub flag: bool,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            enabled: true,
            flag: false,
        }
    }

    pub fn advance_to(&mut self, tick: u64) {
        self.now = Duration::from_secs(tick);
    }
}

impl ActionContext for TestContext {
    fn now(&self) -> Duration {
        self.now
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Shared handle to a recording action's log.
#[derive(Clone)]
pub(crate) struct Probe {
    name: String,
    log: Rc<RefCell<Vec<String>>>,
    finish_at: Option<u64>,
    requirements: ResourceSet,
    policy: InterruptPolicy,
    when_disabled: bool,
}

impl Probe {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: Rc::new(RefCell::new(Vec::new())),
            finish_at: None,
            requirements: ResourceSet::empty(),
            policy: InterruptPolicy::CancelSelf,
            when_disabled: false,
        }
    }

    /// Finish on the first step at or after `tick`.
    pub fn finish_at(mut self, tick: u64) -> Self {
        self.finish_at = Some(tick);
        self
    }

    pub fn requiring(mut self, set: ResourceSet) -> Self {
        self.requirements = set;
        self
    }

    pub fn policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn when_disabled(mut self) -> Self {
        self.when_disabled = true;
        self
    }

    pub fn action(&self) -> ProbeAction {
        ProbeAction {
            probe: self.clone(),
            stepped_at: None,
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn starts(&self) -> usize {
        self.count("start")
    }

    pub fn stops(&self) -> usize {
        self.count("stop(false)") + self.count("stop(true)")
    }

    pub fn interrupted(&self) -> bool {
        self.log.borrow().last().is_some_and(|e| e == "stop(true)")
    }

    pub fn completed(&self) -> bool {
        self.log.borrow().last().is_some_and(|e| e == "stop(false)")
    }

    pub fn is_running(&self) -> bool {
        self.log
            .borrow()
            .iter()
            .rev()
            .find(|e| *e == "start" || e.starts_with("stop"))
            .is_some_and(|e| e == "start")
    }

    fn push(&self, entry: &str) {
        self.log.borrow_mut().push(entry.to_string());
    }
}

pub(crate) struct ProbeAction {
    probe: Probe,
    stepped_at: Option<Duration>,
}

impl Action<TestContext> for ProbeAction {
    fn name(&self) -> &str {
        &self.probe.name
    }

    fn requirements(&self) -> ResourceSet {
        self.probe.requirements
    }

    fn interrupt_policy(&self) -> InterruptPolicy {
        self.probe.policy
    }

    fn runs_when_disabled(&self) -> bool {
        self.probe.when_disabled
    }

    fn start(&mut self, _ctx: &mut TestContext) {
        self.stepped_at = None;
        self.probe.push("start");
    }

    fn step(&mut self, ctx: &mut TestContext) {
        self.stepped_at = Some(ctx.now);
        self.probe.push("step");
    }

    fn is_finished(&self, _ctx: &TestContext) -> bool {
        match (self.probe.finish_at, self.stepped_at) {
            (Some(tick), Some(at)) => at >= Duration::from_secs(tick),
            _ => false,
        }
    }

    fn stop(&mut self, _ctx: &mut TestContext, interrupted: bool) {
        self.probe.push(if interrupted { "stop(true)" } else { "stop(false)" });
    }
}
