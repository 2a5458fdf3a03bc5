//! Game flow state machine
//!
//! A registry of named states with exactly one current state once started.
//! `transition_to` runs the outgoing state's `exit` to completion, swaps the
//! current pointer, then runs the incoming state's `enter`. Async work that
//! `enter` kicks off is detached and never delays the swap.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::context::TransitionContext;
use crate::error::FsmError;
use crate::input::Action;

/// Every state a game can register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateId {
    Menu,
    LevelSelect,
    Playing,
    Paused,
    GoalReached,
    LevelSummary,
    GameOver,
}

impl StateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateId::Menu => "menu",
            StateId::LevelSelect => "levelSelect",
            StateId::Playing => "playing",
            StateId::Paused => "paused",
            StateId::GoalReached => "goalReached",
            StateId::LevelSummary => "levelSummary",
            StateId::GameOver => "gameOver",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "menu" => Some(StateId::Menu),
            "levelSelect" => Some(StateId::LevelSelect),
            "playing" => Some(StateId::Playing),
            "paused" => Some(StateId::Paused),
            "goalReached" => Some(StateId::GoalReached),
            "levelSummary" => Some(StateId::LevelSummary),
            "gameOver" => Some(StateId::GameOver),
            _ => None,
        }
    }
}

/// Lets detached work check whether the state it was started from is
/// still current
#[derive(Debug, Clone)]
pub struct StateTicket {
    epoch: Rc<Cell<u64>>,
    issued: u64,
}

impl StateTicket {
    pub fn is_current(&self) -> bool {
        self.epoch.get() == self.issued
    }
}

/// Request a transition from code that cannot borrow the machine
///
/// Holds a single pending request: a later request replaces an earlier one.
/// The machine applies it at the start of its next `update`.
#[derive(Debug, Clone, Default)]
pub struct TransitionHandle {
    slot: Rc<Cell<Option<StateId>>>,
}

impl TransitionHandle {
    pub fn request(&self, target: StateId) {
        if let Some(previous) = self.slot.replace(Some(target)) {
            log::debug!("Transition request {:?} replaced by {:?}", previous, target);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.get().is_some()
    }

    fn take(&self) -> Option<StateId> {
        self.slot.take()
    }
}

/// Passed to `enter`: where we came from and how to reach back later
#[derive(Debug, Clone)]
pub struct Entry {
    pub from: Option<StateId>,
    pub ticket: StateTicket,
    pub requests: TransitionHandle,
}

/// One registered state
///
/// `update` and `handle_input` return the state to move to, if any; the
/// machine performs the transition after the call returns.
pub trait GameState {
    fn id(&self) -> StateId;

    fn enter(&mut self, entry: &Entry, ctx: &mut TransitionContext<'_>);

    fn exit(&mut self, _ctx: &mut TransitionContext<'_>) {}

    fn update(&mut self, _dt: f32, _ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        None
    }

    fn handle_input(&mut self, action: Action, ctx: &mut TransitionContext<'_>) -> Option<StateId>;
}

/// A completed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<StateId>,
    pub to: StateId,
}

pub struct StateMachine {
    states: HashMap<StateId, Box<dyn GameState>>,
    current: Option<StateId>,
    /// Bumped on every transition; backs [`StateTicket`]
    epoch: Rc<Cell<u64>>,
    requests: TransitionHandle,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            current: None,
            epoch: Rc::new(Cell::new(0)),
            requests: TransitionHandle::default(),
        }
    }

    /// Register a state under its own id, replacing any previous one
    pub fn register(&mut self, state: Box<dyn GameState>) {
        let id = state.id();
        if self.states.insert(id, state).is_some() {
            log::warn!("State {} registered twice, keeping the latest", id.as_str());
        }
    }

    pub fn is_registered(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.current == Some(StateId::Playing)
    }

    pub fn is_paused(&self) -> bool {
        self.current == Some(StateId::Paused)
    }

    /// Handle for detached work and UI callbacks
    pub fn transition_handle(&self) -> TransitionHandle {
        self.requests.clone()
    }

    /// Enter the first state
    pub fn start(
        &mut self,
        initial: StateId,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Transition, FsmError> {
        if self.current.is_some() {
            log::warn!("State machine already started, transitioning instead");
        }
        self.switch(initial, ctx)
    }

    /// Move to `target`; a no-op (with an error) if it is not registered
    pub fn transition_to(
        &mut self,
        target: StateId,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Transition, FsmError> {
        if self.current.is_none() {
            log::warn!("Transition to {} before start ignored", target.as_str());
            return Err(FsmError::NotInitialized);
        }
        self.switch(target, ctx)
    }

    /// Move to a state by name (UI wiring, scripts)
    pub fn transition_to_named(
        &mut self,
        name: &str,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Transition, FsmError> {
        let Some(target) = StateId::parse(name) else {
            log::error!("Unknown state name '{}'", name);
            return Err(FsmError::UnknownState(name.to_string()));
        };
        self.transition_to(target, ctx)
    }

    /// Route an action to the current state
    pub fn handle_input(
        &mut self,
        action: Action,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Option<Transition>, FsmError> {
        let state = self.current_state_mut()?;
        match state.handle_input(action, ctx) {
            Some(next) => self.transition_to(next, ctx).map(Some),
            None => Ok(None),
        }
    }

    /// Apply any pending request, then tick the current state
    pub fn update(
        &mut self,
        dt: f32,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Option<Transition>, FsmError> {
        if self.current.is_none() {
            return Err(FsmError::NotInitialized);
        }
        if let Some(transition) = self.apply_pending(ctx) {
            return Ok(Some(transition));
        }
        let state = self.current_state_mut()?;
        match state.update(dt, ctx) {
            Some(next) => self.transition_to(next, ctx).map(Some),
            None => Ok(None),
        }
    }

    /// Perform the latest request made through a [`TransitionHandle`]
    pub fn apply_pending(&mut self, ctx: &mut TransitionContext<'_>) -> Option<Transition> {
        let target = self.requests.take()?;
        self.transition_to(target, ctx).ok()
    }

    fn current_state_mut(&mut self) -> Result<&mut Box<dyn GameState>, FsmError> {
        let id = self.current.ok_or(FsmError::NotInitialized)?;
        self.states.get_mut(&id).ok_or(FsmError::Unregistered(id))
    }

    fn switch(
        &mut self,
        target: StateId,
        ctx: &mut TransitionContext<'_>,
    ) -> Result<Transition, FsmError> {
        if !self.states.contains_key(&target) {
            log::error!("Cannot transition to unregistered state {}", target.as_str());
            return Err(FsmError::Unregistered(target));
        }

        let from = self.current;
        if let Some(outgoing) = from.and_then(|id| self.states.get_mut(&id)) {
            outgoing.exit(ctx);
        }

        self.current = Some(target);
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        log::info!(
            "State {} -> {}",
            from.map_or("none", |id| id.as_str()),
            target.as_str()
        );

        let entry = Entry {
            from,
            ticket: StateTicket {
                epoch: self.epoch.clone(),
                issued: epoch,
            },
            requests: self.requests.clone(),
        };
        if let Some(incoming) = self.states.get_mut(&target) {
            incoming.enter(&entry, ctx);
        }

        Ok(Transition { from, to: target })
    }
}
