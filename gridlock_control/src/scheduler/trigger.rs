//! Trigger bindings.
//!
//! A trigger is a predicate over the context, sampled exactly once per tick in
//! declaration order. Edges of the sampled value map to start/cancel requests
//! according to the trigger's mode.

use crate::action::ActionContext;

/// How predicate edges map to scheduling requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Rising edge starts the action.
    OnTrue,
    /// Rising edge starts, falling edge cancels.
    WhileTrue,
    /// Rising edge starts the action if idle, cancels it if running.
    ToggleOnTrue,
}

/// Request produced by one trigger sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerSignal {
    None,
    Start,
    Cancel,
    Toggle,
}

/// Edge-detecting predicate.
pub struct Trigger<C: ActionContext> {
    mode: TriggerMode,
    predicate: Box<dyn FnMut(&C) -> bool>,
    last: bool,
}

impl<C: ActionContext> Trigger<C> {
    pub fn new(mode: TriggerMode, predicate: impl FnMut(&C) -> bool + 'static) -> Self {
        Self {
            mode,
            predicate: Box::new(predicate),
            last: false,
        }
    }

    pub fn on_true(predicate: impl FnMut(&C) -> bool + 'static) -> Self {
        Self::new(TriggerMode::OnTrue, predicate)
    }

    pub fn while_true(predicate: impl FnMut(&C) -> bool + 'static) -> Self {
        Self::new(TriggerMode::WhileTrue, predicate)
    }

    pub fn toggle_on_true(predicate: impl FnMut(&C) -> bool + 'static) -> Self {
        Self::new(TriggerMode::ToggleOnTrue, predicate)
    }

    #[inline]
    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Value from the most recent sample.
    #[inline]
    pub fn last_value(&self) -> bool {
        self.last
    }

    /// Sample the predicate once and translate the edge.
    pub(crate) fn poll(&mut self, ctx: &C) -> TriggerSignal {
        let value = (self.predicate)(ctx);
        let rising = value && !self.last;
        let falling = !value && self.last;
        self.last = value;

        match self.mode {
            TriggerMode::OnTrue if rising => TriggerSignal::Start,
            TriggerMode::WhileTrue if rising => TriggerSignal::Start,
            TriggerMode::WhileTrue if falling => TriggerSignal::Cancel,
            TriggerMode::ToggleOnTrue if rising => TriggerSignal::Toggle,
            _ => TriggerSignal::None,
        }
    }
}
