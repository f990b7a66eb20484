//! Ritual state machine
//!
//! Sole writer of [`GameStateData`]. Transitions are checked against a fixed
//! table; anything not in it is rejected and logged, never panics. Every
//! accepted transition runs the target phase's on-enter effects once and
//! then notifies listeners synchronously with a snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ritual::{Ritual, RitualStep};
use super::state::{GamePhase, GameStateData, MonsterState};
use crate::consts::*;

/// Handle returned by [`RitualStateMachine::on`]
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&StateChange)>;

/// Phases reachable from `from`
pub fn allowed_transitions(from: GamePhase) -> &'static [GamePhase] {
    match from {
        GamePhase::Idle => &[GamePhase::RitualStep],
        GamePhase::RitualStep => &[
            GamePhase::RitualStep,
            GamePhase::ItsAlive,
            GamePhase::MonsterMad,
        ],
        GamePhase::MonsterMad => &[GamePhase::RitualStep, GamePhase::Idle],
        GamePhase::ItsAlive => &[GamePhase::RitualStep, GamePhase::Idle],
    }
}

pub fn can_transition(from: GamePhase, to: GamePhase) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Emitted to listeners after every accepted transition
#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    pub previous: GamePhase,
    pub phase: GamePhase,
    pub data: GameStateData,
}

/// Result of [`RitualStateMachine::advance_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAdvance {
    /// Another step is now current and its timer was refreshed
    MoreRemain,
    /// No steps left; the caller must move to `ItsAlive`
    RitualComplete,
}

pub struct RitualStateMachine {
    data: GameStateData,
    min_step_time: f32,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener_id: ListenerId,
}

impl RitualStateMachine {
    pub fn new(ritual: Ritual) -> Self {
        Self::with_min_step_time(ritual, MIN_STEP_TIME)
    }

    /// Create a machine whose step time limits never drop below `min_step_time`
    pub fn with_min_step_time(ritual: Ritual, min_step_time: f32) -> Self {
        let min_step_time = if min_step_time.is_finite() && min_step_time > 0.0 {
            min_step_time
        } else {
            MIN_STEP_TIME
        };
        Self {
            data: GameStateData::new(ritual.sanitized(min_step_time)),
            min_step_time,
            listeners: BTreeMap::new(),
            next_listener_id: 1,
        }
    }

    pub fn current_state(&self) -> GamePhase {
        self.data.phase
    }

    /// Owned snapshot; mutating it has no effect on the machine
    pub fn state_data(&self) -> GameStateData {
        self.data.clone()
    }

    /// Read-only view for per-frame readers that don't need a copy
    pub fn data(&self) -> &GameStateData {
        &self.data
    }

    pub fn current_step(&self) -> Option<&RitualStep> {
        self.data.current_step()
    }

    pub fn min_step_time(&self) -> f32 {
        self.min_step_time
    }

    /// Register a state change listener
    pub fn on(&mut self, listener: impl FnMut(&StateChange) + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move to `to` if the table allows it
    pub fn transition_to(&mut self, to: GamePhase) -> bool {
        let from = self.data.phase;
        if !can_transition(from, to) {
            log::warn!("Rejected transition {} -> {}", from.as_str(), to.as_str());
            return false;
        }

        self.data.phase = to;
        self.on_enter(to);
        log::debug!(
            "{} -> {} (level {}, step {}/{})",
            from.as_str(),
            to.as_str(),
            self.data.level,
            self.data.step_index,
            self.data.ritual.len()
        );
        self.emit(from);
        true
    }

    fn on_enter(&mut self, phase: GamePhase) {
        match phase {
            GamePhase::Idle => {
                self.data.step_index = 0;
                self.data.mistake_count = 0;
                self.data.madness_level = 0;
                self.data.monster_state = MonsterState::Calm;
            }
            GamePhase::RitualStep => {
                // Restarting a finished ritual without loading a new one replays it
                if self.data.step_index >= self.data.ritual.len() {
                    log::debug!("Replaying level {} from the first step", self.data.level);
                    self.data.step_index = 0;
                }
                self.refresh_timer();
                self.data.monster_state = MonsterState::from_madness(self.data.madness_level);
            }
            GamePhase::MonsterMad => {
                self.data.monster_state = MonsterState::Flatline;
            }
            GamePhase::ItsAlive => {
                self.data.monster_state = MonsterState::Alive;
            }
        }
    }

    fn emit(&mut self, previous: GamePhase) {
        if self.listeners.is_empty() {
            return;
        }
        let change = StateChange {
            previous,
            phase: self.data.phase,
            data: self.data.clone(),
        };
        for listener in self.listeners.values_mut() {
            listener(&change);
        }
    }

    fn refresh_timer(&mut self) {
        self.data.time_remaining = self
            .data
            .current_step()
            .map_or(FALLBACK_STEP_TIME, RitualStep::time_limit);
    }

    /// Move to the next step. Data only; the caller performs the transition.
    pub fn advance_step(&mut self) -> StepAdvance {
        let len = self.data.ritual.len();
        if self.data.step_index >= len {
            return StepAdvance::RitualComplete;
        }
        self.data.step_index += 1;
        if self.data.step_index >= len {
            StepAdvance::RitualComplete
        } else {
            self.refresh_timer();
            StepAdvance::MoreRemain
        }
    }

    /// Count a mistake and re-derive the monster's mood
    pub fn register_mistake(&mut self) {
        self.data.mistake_count = self.data.mistake_count.saturating_add(1);
        self.data.madness_level = self.data.madness_level.saturating_add(1);
        self.data.monster_state = MonsterState::from_madness(self.data.madness_level);
        log::debug!(
            "Mistake {} (madness {}, monster {})",
            self.data.mistake_count,
            self.data.madness_level,
            self.data.monster_state.as_str()
        );
    }

    /// Run the step timer down. Returns true if this call timed the step out.
    ///
    /// Only ticks during `RitualStep`. Non-positive deltas are ignored.
    pub fn update_time(&mut self, delta_seconds: f32) -> bool {
        if self.data.phase != GamePhase::RitualStep
            || delta_seconds.is_nan()
            || delta_seconds <= 0.0
        {
            return false;
        }
        self.data.time_remaining = (self.data.time_remaining - delta_seconds).max(0.0);
        if self.data.time_remaining > 0.0 {
            return false;
        }
        log::info!(
            "Step {} of level {} timed out",
            self.data.step_index + 1,
            self.data.level
        );
        self.transition_to(GamePhase::MonsterMad)
    }

    /// Rewind the current ritual for a retry. Does not change phase.
    pub fn reset_to_first_step(&mut self) {
        self.data.step_index = 0;
        self.data.mistake_count = 0;
        self.data.madness_level = 0;
        self.data.monster_state = MonsterState::Calm;
        self.refresh_timer();
    }

    /// Replace the ritual wholesale and rewind to its first step
    pub fn load_ritual(&mut self, ritual: Ritual) {
        let ritual = ritual.sanitized(self.min_step_time);
        log::info!("Loaded level {} ritual ({} steps)", ritual.level(), ritual.len());
        self.data.level = ritual.level();
        self.data.ritual = ritual;
        self.data.step_index = 0;
        self.refresh_timer();
    }
}
