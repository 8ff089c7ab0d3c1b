//! Cooperative action scheduler.
//!
//! The scheduler owns every action it may run, each in an indexed slot
//! addressed by an `ActionId`. Once per control period `tick()` samples the
//! triggers, processes cancellations, arbitrates resource claims, starts and
//! steps actions, retires the finished ones and fills idle resources with
//! their default actions.
//!
//! ```text
//! tick N:  begin ─▶ disable sweep ─▶ triggers ─▶ cancels ─▶ arbitrate
//!               ─▶ start ─▶ step (start order) ─▶ retire ─▶ defaults
//! ```
//!
//! Invariants:
//! - `stop()` runs exactly once for every `start()`, on every exit path.
//! - A resource has at most one running holder. Default holders are preempted
//!   the same tick an explicit action claims the resource.
//! - Newly started actions are stepped in the tick they start. Defaults are
//!   started last and stepped from the next tick on.

mod arbitration;
mod event;
mod trigger;

pub use arbitration::{ClaimResult, HolderInfo, ResourceTable};
pub use event::{ActionId, InterruptCause, RejectReason, SchedulerEvent};
pub use trigger::{Trigger, TriggerMode};

use gridlock_common::consts::{EVENT_LOG_CAPACITY, MAX_RESOURCES};
use gridlock_common::resource::{Resource, ResourceId, ResourceSet};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::action::{ActionContext, ActionState, BoxedAction, InterruptPolicy};
use trigger::TriggerSignal;

// ─── Errors ─────────────────────────────────────────────────────────

/// Misuse of the scheduler's setup surface.
///
/// Resource conflicts at runtime are never errors; they show up as
/// `SchedulerEvent::Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("resource {0} is already registered")]
    DuplicateResource(ResourceId),

    #[error("action requires unregistered resources {0:?}")]
    UnknownResource(ResourceSet),

    #[error("resources must be registered before the first tick")]
    RegistrationClosed,

    #[error("no action with id {0}")]
    UnknownAction(ActionId),

    #[error("default action for {resource} must require exactly that resource, got {requirements:?}")]
    DefaultRequirementMismatch {
        resource: ResourceId,
        requirements: ResourceSet,
    },

    #[error("resource {0} already has a default action")]
    DuplicateDefault(ResourceId),
}

// ─── Slots ──────────────────────────────────────────────────────────

struct Slot<C: ActionContext> {
    action: BoxedAction<C>,
    state: ActionState,
    requirements: ResourceSet,
    policy: InterruptPolicy,
    when_disabled: bool,
    is_default: bool,
}

struct Binding<C: ActionContext> {
    id: ActionId,
    trigger: Trigger<C>,
}

/// Read-only view of one slot, for telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub id: ActionId,
    pub name: String,
    pub state: ActionState,
    pub is_default: bool,
}

// ─── Scheduler ──────────────────────────────────────────────────────

pub struct Scheduler<C: ActionContext> {
    resources: Vec<Resource>,
    registered: ResourceSet,
    slots: Vec<Slot<C>>,
    bindings: Vec<Binding<C>>,
    defaults: [Option<ActionId>; MAX_RESOURCES],
    table: ResourceTable,
    /// One-shot start requests, consumed by the next tick.
    pending: Vec<ActionId>,
    /// Cancel requests, consumed by the next tick.
    cancels: Vec<ActionId>,
    /// Running actions in start order.
    running: Vec<ActionId>,
    /// Bounded to `EVENT_LOG_CAPACITY`.
    events: Vec<SchedulerEvent>,
    dropped_events: u64,
    cycle: u64,
    started: bool,
}

impl<C: ActionContext> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ActionContext> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            registered: ResourceSet::empty(),
            slots: Vec::new(),
            bindings: Vec::new(),
            defaults: [None; MAX_RESOURCES],
            table: ResourceTable::new(),
            pending: Vec::new(),
            cancels: Vec::new(),
            running: Vec::new(),
            events: Vec::new(),
            dropped_events: 0,
            cycle: 0,
            started: false,
        }
    }

    // ── Setup ──

    /// Register a resource. Only allowed before the first tick.
    pub fn register(&mut self, resource: Resource) -> Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::RegistrationClosed);
        }
        if self.registered.contains(resource.id.mask()) {
            return Err(SchedulerError::DuplicateResource(resource.id));
        }
        debug!(resource = %resource.id, label = %resource.label, "resource registered");
        self.registered |= resource.id.mask();
        self.resources.push(resource);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<(), SchedulerError> {
        resources.into_iter().try_for_each(|r| self.register(r))
    }

    /// Take ownership of an action without scheduling it.
    pub fn add(&mut self, action: BoxedAction<C>) -> Result<ActionId, SchedulerError> {
        self.insert(action, false)
    }

    /// Add an action and bind it to a trigger.
    pub fn bind(
        &mut self,
        action: BoxedAction<C>,
        trigger: Trigger<C>,
    ) -> Result<ActionId, SchedulerError> {
        let id = self.add(action)?;
        self.bindings.push(Binding { id, trigger });
        Ok(id)
    }

    /// Bind an already added action to another trigger.
    pub fn bind_existing(&mut self, id: ActionId, trigger: Trigger<C>) -> Result<(), SchedulerError> {
        self.check_id(id)?;
        self.bindings.push(Binding { id, trigger });
        Ok(())
    }

    /// Add an action and request a one-shot start on the next tick.
    pub fn schedule(&mut self, action: BoxedAction<C>) -> Result<ActionId, SchedulerError> {
        let id = self.add(action)?;
        self.pending.push(id);
        Ok(id)
    }

    /// Install the default action of `resource`.
    ///
    /// The action must require exactly that one resource.
    pub fn set_default(
        &mut self,
        resource: ResourceId,
        action: BoxedAction<C>,
    ) -> Result<ActionId, SchedulerError> {
        if !self.registered.contains(resource.mask()) {
            return Err(SchedulerError::UnknownResource(resource.mask()));
        }
        let requirements = action.requirements();
        if requirements != resource.mask() {
            return Err(SchedulerError::DefaultRequirementMismatch {
                resource,
                requirements,
            });
        }
        if self.defaults[resource.index()].is_some() {
            return Err(SchedulerError::DuplicateDefault(resource));
        }
        let id = self.insert(action, true)?;
        self.defaults[resource.index()] = Some(id);
        Ok(id)
    }

    fn insert(&mut self, action: BoxedAction<C>, is_default: bool) -> Result<ActionId, SchedulerError> {
        let requirements = action.requirements();
        let unknown = requirements.difference(self.registered);
        if !unknown.is_empty() {
            return Err(SchedulerError::UnknownResource(unknown));
        }
        let id = ActionId(self.slots.len());
        trace!(%id, action = action.name(), ?requirements, is_default, "action added");
        self.slots.push(Slot {
            policy: action.interrupt_policy(),
            when_disabled: action.runs_when_disabled(),
            action,
            state: ActionState::Idle,
            requirements,
            is_default,
        });
        Ok(id)
    }

    fn check_id(&self, id: ActionId) -> Result<(), SchedulerError> {
        if id.index() < self.slots.len() {
            Ok(())
        } else {
            Err(SchedulerError::UnknownAction(id))
        }
    }

    // ── Requests ──

    /// Request a one-shot start on the next tick. A request for an action that
    /// is already running is a silent no-op.
    pub fn request(&mut self, id: ActionId) -> Result<(), SchedulerError> {
        self.check_id(id)?;
        self.pending.push(id);
        Ok(())
    }

    /// Request cancellation on the next tick.
    pub fn cancel(&mut self, id: ActionId) -> Result<(), SchedulerError> {
        self.check_id(id)?;
        self.cancels.push(id);
        Ok(())
    }

    // ── Tick ──

    /// Advance every running action by one control period.
    ///
    /// Lifecycle events accumulate until `drain_events()` is called. The
    /// caller is expected to drain once per tick; undrained events are kept
    /// up to `EVENT_LOG_CAPACITY`, after which the oldest half is discarded.
    pub fn tick(&mut self, ctx: &mut C) {
        self.started = true;
        self.cycle += 1;
        self.table.begin_tick();
        let enabled = ctx.is_enabled();

        if !enabled {
            let doomed: Vec<ActionId> = self
                .running
                .iter()
                .copied()
                .filter(|id| !self.slots[id.index()].when_disabled)
                .collect();
            for id in doomed {
                self.interrupt(ctx, id, InterruptCause::Disabled);
            }
        }

        // One-shot requests first, then triggers in declaration order.
        let mut candidates = std::mem::take(&mut self.pending);
        let mut cancels = std::mem::take(&mut self.cancels);
        for binding in &mut self.bindings {
            match binding.trigger.poll(ctx) {
                TriggerSignal::None => {}
                TriggerSignal::Start => candidates.push(binding.id),
                TriggerSignal::Cancel => cancels.push(binding.id),
                TriggerSignal::Toggle => {
                    if self.slots[binding.id.index()].state.is_running() {
                        cancels.push(binding.id);
                    } else {
                        candidates.push(binding.id);
                    }
                }
            }
        }

        for id in cancels {
            self.interrupt(ctx, id, InterruptCause::Cancelled);
        }

        let mut starting: Vec<ActionId> = Vec::new();
        for (pos, &id) in candidates.iter().enumerate() {
            if candidates[..pos].contains(&id) {
                continue;
            }
            let slot = &self.slots[id.index()];
            if slot.state.is_running() || slot.is_default {
                continue;
            }
            if !enabled && !slot.when_disabled {
                self.emit(SchedulerEvent::Rejected {
                    cycle: self.cycle,
                    id,
                    blocked_by: None,
                    reason: RejectReason::Disabled,
                });
                continue;
            }

            let requirements = slot.requirements;
            let slots = &self.slots;
            let claim = self.table.arbitrate(requirements, |holder| {
                let held = &slots[holder.index()];
                HolderInfo {
                    policy: held.policy,
                    is_default: held.is_default,
                }
            });
            match claim {
                ClaimResult::Rejected { blocked_by, reason } => {
                    self.emit(SchedulerEvent::Rejected {
                        cycle: self.cycle,
                        id,
                        blocked_by: Some(blocked_by),
                        reason,
                    });
                }
                ClaimResult::Granted { preempt } => {
                    for holder in preempt {
                        self.interrupt(ctx, holder, InterruptCause::Preempted { by: id });
                    }
                    self.table.acquire(requirements, id);
                    starting.push(id);
                }
            }
        }

        for id in starting {
            self.start(ctx, id);
        }

        let snapshot = self.running.clone();
        for &id in &snapshot {
            self.slots[id.index()].action.step(ctx);
        }
        for id in snapshot {
            if self.slots[id.index()].action.is_finished(ctx) {
                self.finish(ctx, id);
            }
        }

        self.start_defaults(ctx, enabled);
    }

    /// Stop every running action with `interrupted = true`.
    ///
    /// Pending requests are dropped. The scheduler may be ticked again
    /// afterwards.
    pub fn shutdown(&mut self, ctx: &mut C) {
        let running = self.running.clone();
        info!(cycle = self.cycle, running = running.len(), "scheduler shutdown");
        for id in running.into_iter().rev() {
            self.interrupt(ctx, id, InterruptCause::Shutdown);
        }
        self.pending.clear();
        self.cancels.clear();
    }

    fn start_defaults(&mut self, ctx: &mut C, enabled: bool) {
        for resource in self.registered.ids() {
            if self.table.holder(resource).is_some() {
                continue;
            }
            let Some(id) = self.defaults[resource.index()] else {
                continue;
            };
            let slot = &self.slots[id.index()];
            if slot.state.is_running() || (!enabled && !slot.when_disabled) {
                continue;
            }
            self.table.acquire(slot.requirements, id);
            self.start(ctx, id);
        }
    }

    fn start(&mut self, ctx: &mut C, id: ActionId) {
        let slot = &mut self.slots[id.index()];
        slot.action.start(ctx);
        slot.state = ActionState::Running;
        let is_default = slot.is_default;
        self.running.push(id);
        self.emit(SchedulerEvent::Started {
            cycle: self.cycle,
            id,
            is_default,
        });
    }

    fn finish(&mut self, ctx: &mut C, id: ActionId) {
        let slot = &mut self.slots[id.index()];
        slot.action.stop(ctx, false);
        slot.state = ActionState::Finished;
        let requirements = slot.requirements;
        self.table.release(requirements, id);
        self.running.retain(|&r| r != id);
        self.emit(SchedulerEvent::Finished {
            cycle: self.cycle,
            id,
        });
    }

    /// Stop a running action with `interrupted = true`. No-op otherwise.
    fn interrupt(&mut self, ctx: &mut C, id: ActionId, cause: InterruptCause) {
        let slot = &mut self.slots[id.index()];
        if !slot.state.is_running() {
            return;
        }
        slot.action.stop(ctx, true);
        slot.state = ActionState::Idle;
        let requirements = slot.requirements;
        self.table.release(requirements, id);
        self.running.retain(|&r| r != id);
        self.emit(SchedulerEvent::Interrupted {
            cycle: self.cycle,
            id,
            cause,
        });
    }

    fn emit(&mut self, event: SchedulerEvent) {
        event.log(self.slots[event.id().index()].action.name());
        if self.events.len() >= EVENT_LOG_CAPACITY {
            let discard = EVENT_LOG_CAPACITY / 2;
            self.events.drain(..discard);
            self.dropped_events += discard as u64;
            warn!(
                cycle = self.cycle,
                discarded = discard,
                total = self.dropped_events,
                "event log full, discarding oldest events"
            );
        }
        self.events.push(event);
    }

    // ── Queries ──

    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn state(&self, id: ActionId) -> Option<ActionState> {
        self.slots.get(id.index()).map(|s| s.state)
    }

    pub fn is_running(&self, id: ActionId) -> bool {
        self.state(id).is_some_and(ActionState::is_running)
    }

    pub fn name(&self, id: ActionId) -> Option<&str> {
        self.slots.get(id.index()).map(|s| s.action.name())
    }

    /// Current holder of a resource.
    pub fn holder(&self, resource: ResourceId) -> Option<ActionId> {
        self.table.holder(resource)
    }

    /// Default action installed for a resource.
    pub fn default_for(&self, resource: ResourceId) -> Option<ActionId> {
        self.defaults[resource.index()]
    }

    /// Running actions in start order.
    pub fn running(&self) -> &[ActionId] {
        &self.running
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events discarded because the log was full.
    #[inline]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub fn statuses(&self) -> Vec<ActionStatus> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| ActionStatus {
                id: ActionId(i),
                name: slot.action.name().to_string(),
                state: slot.state,
                is_default: slot.is_default,
            })
            .collect()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
