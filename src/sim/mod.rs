//! Deterministic ritual simulation
//!
//! All gameplay rules live here. This module must stay pure and deterministic:
//! - Time only advances through `update_time`
//! - Seeded RNG only (ritual variants)
//! - No rendering, audio or platform dependencies

pub mod catalog;
pub mod difficulty;
pub mod logic;
pub mod machine;
pub mod ritual;
pub mod state;

pub use catalog::{BASE_STEPS, EXTRA_STEPS, StepTemplate};
pub use difficulty::{DifficultyConfig, RitualGenerator, ritual_for_level};
pub use logic::{
    InputOutcome, complete_ritual_step, handle_input, handle_ritual_failure, retry_ritual,
    start_new_ritual, start_ritual_sequence, validate_action,
};
pub use machine::{
    ListenerId, RitualStateMachine, StateChange, StepAdvance, allowed_transitions, can_transition,
};
pub use ritual::{InputAction, Ritual, RitualError, RitualStep, SurgicalObject};
pub use state::{GamePhase, GameStateData, MonsterState};
