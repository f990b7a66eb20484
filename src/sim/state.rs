//! Game state and core simulation types
//!
//! `GameStateData` is owned and mutated only by the ritual state machine.
//! Everyone else sees clones.

use serde::{Deserialize, Serialize};

use super::ritual::{Ritual, RitualStep};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Waiting for the player to start
    #[default]
    Idle,
    /// A step is live and its timer is running
    RitualStep,
    /// Wrong action or timeout; waiting for retry or reset
    MonsterMad,
    /// Every step done, the monster lives
    ItsAlive,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "IDLE",
            GamePhase::RitualStep => "RITUAL_STEP",
            GamePhase::MonsterMad => "MONSTER_MAD",
            GamePhase::ItsAlive => "ITS_ALIVE",
        }
    }
}

/// Monster's emotional/EKG state shown on the console screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonsterState {
    #[default]
    Calm,
    Nervous,
    Angry,
    Flatline,
    Alive,
}

impl MonsterState {
    /// Mood derived from accumulated madness (terminal phases override this)
    pub fn from_madness(madness: u32) -> Self {
        if madness >= ANGRY_MADNESS {
            MonsterState::Angry
        } else if madness >= NERVOUS_MADNESS {
            MonsterState::Nervous
        } else {
            MonsterState::Calm
        }
    }

    /// Heart rate drawn by the EKG trace
    pub fn heart_rate_bpm(&self) -> u32 {
        match self {
            MonsterState::Calm => 60,
            MonsterState::Nervous => 100,
            MonsterState::Angry => 150,
            MonsterState::Flatline => 0,
            MonsterState::Alive => 80,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonsterState::Calm => "CALM",
            MonsterState::Nervous => "NERVOUS",
            MonsterState::Angry => "ANGRY",
            MonsterState::Flatline => "FLATLINE",
            MonsterState::Alive => "ALIVE",
        }
    }
}

/// Complete ritual progress for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateData {
    pub phase: GamePhase,
    pub ritual: Ritual,
    /// In `[0, ritual.len()]`; equals `len` only right after the last step
    pub step_index: usize,
    pub mistake_count: u32,
    /// Seconds left on the current step
    pub time_remaining: f32,
    pub monster_state: MonsterState,
    pub madness_level: u32,
    /// Mirrors `ritual.level()`
    pub level: u32,
}

impl GameStateData {
    pub fn new(ritual: Ritual) -> Self {
        let time_remaining = ritual
            .step(0)
            .map_or(FALLBACK_STEP_TIME, RitualStep::time_limit);
        Self {
            phase: GamePhase::Idle,
            level: ritual.level(),
            ritual,
            step_index: 0,
            mistake_count: 0,
            time_remaining,
            monster_state: MonsterState::Calm,
            madness_level: 0,
        }
    }

    pub fn current_step(&self) -> Option<&RitualStep> {
        self.ritual.step(self.step_index)
    }

    pub fn steps_remaining(&self) -> usize {
        self.ritual.len().saturating_sub(self.step_index)
    }

    /// Fraction of the current step's time still left (1.0 = full)
    pub fn time_fraction(&self) -> f32 {
        match self.current_step() {
            Some(step) => (self.time_remaining / step.time_limit()).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}
